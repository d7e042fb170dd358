//! End-to-end behaviour of the assembled tree, driven the way the app drives it

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tinsel::gfx::picking::ScreenRect;
use tinsel::photos::{EmptyListing, PhotoLoader, PhotoOrigin};
use tinsel::simulation::{Detection, Gesture, GestureOutcome, Mode, PointerEvent, PointerOutcome};
use tinsel::{ChristmasTree, SceneConfig};

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

fn small_tree(now: Instant) -> ChristmasTree {
    let config = SceneConfig::default()
        .with_seed(42)
        .with_ornament_count(40)
        .with_dust_count(40);
    ChristmasTree::new(config, WIDTH / HEIGHT, now)
}

/// Raw detector output for one hand
///
/// Fingertips sit `spread` above the wrist; the thumb tip is `pinch` to the
/// right of the index tip.
fn detection(spread: f32, pinch: f32) -> Detection {
    let wrist = (0.5, 0.9);
    let mut points = vec![(0.5, 0.5); 21];
    points[0] = wrist;
    for tip in [8, 12, 16, 20] {
        points[tip] = (wrist.0, wrist.1 - spread);
    }
    points[4] = (points[8].0 + pinch, points[8].1);
    Detection::from_points(&[points]).unwrap()
}

fn add_photos(tree: &mut ChristmasTree, count: usize) {
    for i in 0..count {
        tree.add_photo(format!("photo-{i}"), Arc::new(RgbaImage::new(300, 200)));
    }
}

#[test]
fn pinch_focuses_a_photo() {
    let now = Instant::now();
    let mut tree = small_tree(now);
    add_photos(&mut tree, 3);

    let outcome = tree.apply_detection(&detection(0.3, 0.02), now);
    assert_eq!(outcome, GestureOutcome::Hand(Gesture::Pinch));
    assert_eq!(tree.state().mode(), Mode::Focus);
    assert!(tree.state().hand.detected);

    let target = tree.state().focus_target().unwrap();
    assert!(tree.particles().photos().contains(&target));
}

#[test]
fn clicking_the_focused_photo_returns_to_tree() {
    let config = SceneConfig::default()
        .with_seed(7)
        .with_ornament_count(0)
        .with_dust_count(0);
    let start = Instant::now();
    let mut tree = ChristmasTree::new(config, WIDTH / HEIGHT, start);
    add_photos(&mut tree, 1);

    tree.apply_detection(&detection(0.3, 0.02), start);
    let focused = tree.state().focus_target().unwrap();

    // Let the photo settle in front of the camera
    let mut now = start;
    for _ in 0..300 {
        now += Duration::from_millis(16);
        tree.tick(now, WIDTH as u32);
    }

    let rect = ScreenRect::from_size(WIDTH, HEIGHT);
    let click = PointerEvent::click(WIDTH / 2.0, HEIGHT / 2.0, now);
    assert_eq!(
        tree.particles().photos(),
        vec![focused],
        "only one photo exists"
    );
    assert_eq!(tree.handle_pointer(&click, &rect), PointerOutcome::Unfocused);
    assert_eq!(tree.state().mode(), Mode::Tree);
    assert_eq!(tree.state().focus_target(), None);
}

#[test]
fn open_hand_scatters() {
    let now = Instant::now();
    let mut tree = small_tree(now);
    add_photos(&mut tree, 2);

    let outcome = tree.apply_detection(&detection(0.5, 0.3), now);
    assert_eq!(outcome, GestureOutcome::Hand(Gesture::Open));
    assert_eq!(tree.state().mode(), Mode::Scatter);
    assert_eq!(tree.state().focus_target(), None);

    // Feeding the same classification again changes nothing
    tree.apply_detection(&detection(0.5, 0.3), now + Duration::from_millis(33));
    assert_eq!(tree.state().mode(), Mode::Scatter);
    assert_eq!(tree.state().focus_target(), None);
}

#[test]
fn gestures_wait_for_recent_clicks() {
    let start = Instant::now();
    let mut tree = small_tree(start);
    let rect = ScreenRect::from_size(WIDTH, HEIGHT);

    // A click on empty sky in the corner
    let outcome = tree.handle_pointer(&PointerEvent::click(2.0, 2.0, start), &rect);
    assert_eq!(outcome, PointerOutcome::Missed);

    let outcome = tree.apply_detection(&detection(0.5, 0.3), start + Duration::from_millis(1500));
    assert_eq!(outcome, GestureOutcome::Suppressed);
    assert_eq!(tree.state().mode(), Mode::Tree);

    let outcome = tree.apply_detection(&detection(0.5, 0.3), start + Duration::from_millis(2500));
    assert_eq!(outcome, GestureOutcome::Hand(Gesture::Open));
    assert_eq!(tree.state().mode(), Mode::Scatter);
}

#[test]
fn empty_listing_yields_fallback_photos() {
    let now = Instant::now();
    let mut tree = small_tree(now);
    let mut loader = PhotoLoader::new(5).unwrap();

    loader.load_remote(Arc::new(EmptyListing));
    let photos = loader.finish_blocking();
    assert!(loader.is_idle());
    assert_eq!(photos.len(), 5);
    assert!(photos.iter().all(|photo| photo.origin == PhotoOrigin::Fallback));

    for photo in photos {
        tree.add_photo(photo.label, Arc::new(photo.image));
    }
    assert_eq!(tree.photo_count(), 5);
    assert_eq!(tree.scene().textures().len(), 5);
}
