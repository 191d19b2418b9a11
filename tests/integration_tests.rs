use tidybox::domain::{CleanupError, Container, ContainerState, Image};
use tidybox::services::{Auditor, Inventory, Matcher, select};

#[test]
fn test_select_star_returns_all_items() {
    let items = vec!["a", "b/c", "d:e"];
    let selected = select("*", false, items.clone(), |s| *s).unwrap();
    assert_eq!(selected, items);
}

#[test]
fn test_select_regex_prefix_semantics() {
    let selected = select("^web", true, ["web:latest", "webapp:1", "other:2"], |s| *s).unwrap();
    assert_eq!(selected, vec!["web:latest", "webapp:1"]);
}

#[test]
fn test_select_invalid_regex() {
    let err = select("*web", true, ["web"], |s| *s).unwrap_err();
    assert!(matches!(err, CleanupError::InvalidPattern { .. }));
}

#[test]
fn test_matcher_over_container_names() {
    let containers = vec![
        Container::new("1", "api-blue", ContainerState::Stopped),
        Container::new("2", "api-green", ContainerState::Stopped),
        Container::new("3", "worker", ContainerState::Stopped),
    ];
    let matcher = Matcher::new("api-?????", false).unwrap();
    let names: Vec<&str> = matcher
        .select(&containers, |c| c.name.as_str())
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["api-green"]);
}

#[test]
fn test_overlapping_classifications() {
    // An untagged image can be in use while its container is also stale.
    let inventory = Inventory {
        images: vec![
            Image::new("sha256:old", vec![]),
            Image::new("sha256:new", vec!["svc:latest".into()]),
        ],
        containers: vec![
            Container::new("c1", "svc", ContainerState::Running).with_image("sha256:old", "svc:latest"),
        ],
        volumes: vec![],
    };
    let auditor = Auditor::new(&inventory);

    assert_eq!(auditor.stale_tag_containers().count(), 1);
    assert_eq!(auditor.untagged_images_in_use().count(), 1);
    assert_eq!(auditor.dangling_images().count(), 0);
}
