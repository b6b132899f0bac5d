use vehicle_track::tracker::{Association, TrackState};
use vehicle_track::{CentroidTracker, Detection, Direction, Rect, TrackerConfig};

fn det(class: &str, cx: f32, cy: f32) -> Detection {
    Detection::from_rect(Rect::from_cxcywh(cx, cy, 0.1, 0.1), 0.9, 0, class)
}

#[test]
fn test_basic_tracking() {
    let mut tracker = CentroidTracker::new(TrackerConfig::default());

    // Frame 1: One detection
    let tracks1 = tracker.update(&[det("car", 0.30, 0.30)]);
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].track_id;

    // Frame 2: Same object moved slightly
    let tracks2 = tracker.update(&[det("car", 0.32, 0.31)]);
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].track_id, id1); // ID should persist

    // Frame 3: Object missed, last known box is still reported
    let tracks3 = tracker.update(&[]);
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].track_id, id1);
    assert_eq!(tracks3[0].state, TrackState::Missing);

    // Frame 4: Object reappears close by
    let tracks4 = tracker.update(&[det("car", 0.35, 0.32)]);
    assert_eq!(tracks4.len(), 1);
    assert_eq!(tracks4[0].track_id, id1);
    assert_eq!(tracks4[0].state, TrackState::Tracked);
    assert_eq!(tracker.get(id1).unwrap().disappeared, 0);
}

#[test]
fn test_disappearance_boundary() {
    let mut tracker = CentroidTracker::new(TrackerConfig {
        max_disappeared: 3,
        ..Default::default()
    });
    tracker.update(&[det("car", 0.5, 0.5)]);

    for _ in 0..3 {
        tracker.update(&[]);
    }
    assert_eq!(tracker.len(), 1);

    tracker.update(&[]);
    assert!(tracker.is_empty());
}

#[test]
fn test_sequences_are_never_reused() {
    let mut tracker = CentroidTracker::new(TrackerConfig {
        max_disappeared: 1,
        ..Default::default()
    });

    let first = tracker.update(&[det("car", 0.2, 0.2), det("bus", 0.8, 0.8)]);
    assert_eq!(first.iter().map(|b| b.sequence).collect::<Vec<_>>(), vec![1, 1]);

    tracker.update(&[]);
    tracker.update(&[]);
    assert!(tracker.is_empty());

    let boxes = tracker.update(&[det("car", 0.2, 0.2), det("car", 0.6, 0.2), det("truck", 0.5, 0.8)]);
    let seqs: Vec<(&str, u32)> = boxes.iter().map(|b| (b.class_name.as_str(), b.sequence)).collect();
    assert_eq!(seqs, vec![("car", 2), ("car", 3), ("truck", 1)]);
    assert!(boxes.iter().all(|b| b.track_id > first[1].track_id));
}

#[test]
fn test_direction_labels() {
    let cases = [
        ((0.03, 0.03), Direction::DownRight, "car #1\nDownRight"),
        ((0.005, 0.03), Direction::Down, "car #1\nDown"),
        ((0.005, 0.005), Direction::None, "car #1\n"),
    ];

    for ((dx, dy), expected, label) in cases {
        let mut tracker = CentroidTracker::default();
        tracker.update(&[det("car", 0.5, 0.5)]);
        let boxes = tracker.update(&[det("car", 0.5 + dx, 0.5 + dy)]);

        assert_eq!(boxes[0].direction, expected);
        assert_eq!(boxes[0].label(), label);
    }
}

#[test]
fn test_optimal_association_resolves_crossing_paths() {
    let config = |association| TrackerConfig {
        association,
        ..Default::default()
    };

    // Both cars move right by 0.15. Greedy takes the closest pair first
    // (second car to first detection) and strands the first car.
    let start = [det("car", 0.40, 0.5), det("car", 0.60, 0.5)];
    let next = [det("car", 0.55, 0.5), det("car", 0.75, 0.5)];

    let mut greedy = CentroidTracker::new(config(Association::Greedy));
    let ids: Vec<u64> = greedy.update(&start).iter().map(|b| b.track_id).collect();
    let boxes = greedy.update(&next);
    assert_eq!(boxes.len(), 3);
    assert_eq!(boxes[0].track_id, ids[0]);
    assert_eq!(boxes[0].state, TrackState::Missing);

    let mut optimal = CentroidTracker::new(config(Association::Optimal));
    let ids: Vec<u64> = optimal.update(&start).iter().map(|b| b.track_id).collect();
    let boxes = optimal.update(&next);
    assert_eq!(boxes.iter().map(|b| b.track_id).collect::<Vec<_>>(), ids);
    assert!(boxes.iter().all(|b| b.state == TrackState::Tracked));
    assert!((boxes[0].detection.center().0 - 0.55).abs() < 1e-5);
}
