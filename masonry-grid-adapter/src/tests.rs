use crate::*;

use alloc::vec::Vec;
use std::sync::{Arc, Mutex};

use masonry_grid::{
    Animation, Easing, Grid, GridOptions, ItemRect, ItemView, Record, Viewport,
};

#[derive(Clone, Debug, PartialEq)]
struct Tile {
    id: u32,
    height: u32,
}

impl Record for Tile {
    fn explicit_height(&self) -> Option<u32> {
        Some(self.height)
    }
}

fn tiles(n: u32) -> Vec<Tile> {
    (0..n).map(|id| Tile { id, height: 100 }).collect()
}

fn options(viewport: &Arc<Mutex<Viewport>>) -> GridOptions<Tile> {
    let viewport = Arc::clone(viewport);
    GridOptions::new(
        move || *viewport.lock().unwrap(),
        |_view: &mut ItemView, _tile: &Tile| {},
    )
}

fn rect(x: i64, y: i64, width: u32, height: u32) -> ItemRect {
    ItemRect {
        x,
        y,
        width,
        height,
    }
}

#[test]
fn rect_tween_interpolates_and_finishes() {
    let tween = RectTween::new(
        rect(0, 0, 100, 100),
        rect(100, 200, 200, 50),
        1000,
        100,
        Easing::Linear,
    );
    assert_eq!(tween.sample(900), rect(0, 0, 100, 100));
    assert_eq!(tween.sample(1050), rect(50, 100, 150, 75));
    assert!(!tween.is_done(1099));
    assert!(tween.is_done(1100));
    assert_eq!(tween.sample(5000), rect(100, 200, 200, 50));
}

#[test]
fn rect_tween_handles_negative_coordinates_and_zero_duration() {
    let tween = RectTween::new(rect(0, 0, 10, 10), rect(-100, -50, 10, 10), 0, 0, Easing::Linear);
    assert_eq!(tween.duration_ms, 1);
    assert!(tween.is_done(1));

    let tween = RectTween::new(rect(0, 0, 10, 10), rect(-100, -50, 10, 10), 0, 4, Easing::Linear);
    assert_eq!(tween.sample(1), rect(-25, -13, 10, 10));
}

#[test]
fn rect_tween_retarget_starts_from_current_sample() {
    let mut tween = RectTween::new(
        rect(0, 0, 100, 100),
        rect(100, 0, 100, 100),
        0,
        100,
        Easing::Linear,
    );
    tween.retarget(50, rect(50, 200, 100, 100), 200);
    assert_eq!(tween.from, rect(50, 0, 100, 100));
    assert_eq!(tween.start_ms, 50);
    assert_eq!(tween.sample(150), rect(50, 100, 100, 100));
    assert!(tween.is_done(250));
}

#[test]
fn controller_snaps_without_animation() {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 300, 0)));
    let grid = Grid::with_records(
        options(&viewport).with_animation(Animation::DISABLED),
        tiles(30),
    )
    .unwrap();
    let mut controller = Controller::from_grid(grid);

    controller
        .grid_mut()
        .insert(Tile {
            id: 1000,
            height: 100,
        })
        .unwrap();
    assert_eq!(controller.tick(16).unwrap(), None);
    assert!(!controller.is_animating());
    for item in controller.frame(16) {
        let view = controller.grid().item(item.slot).unwrap();
        assert_eq!(item.rect, view.rect());
        assert_eq!(Some(item.index), view.bound_index());
    }
}

#[test]
fn controller_tweens_views_moved_by_an_insert() {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 300, 0)));
    let animation = Animation {
        enabled: true,
        duration_ms: 300,
        easing: Easing::Linear,
    };
    let grid = Grid::with_records(options(&viewport).with_animation(animation), tiles(30)).unwrap();
    let mut controller = Controller::from_grid(grid);
    let before: Vec<Option<ItemRect>> = (0..controller.grid().items().len())
        .map(|slot| controller.rect(slot, 0))
        .collect();

    controller
        .grid_mut()
        .insert(Tile {
            id: 1000,
            height: 100,
        })
        .unwrap();
    controller.tick(100).unwrap();
    assert!(controller.is_animating());

    let (slot, from, to) = controller
        .grid()
        .items()
        .iter()
        .filter(|view| view.in_transition())
        .find_map(|view| {
            let from = before[view.slot()]?;
            (from != view.rect()).then(|| (view.slot(), from, view.rect()))
        })
        .expect("the old head moves");

    // The tween starts where the view was last drawn.
    assert_eq!(controller.rect(slot, 100), Some(from));
    let mid = controller.rect(slot, 200).unwrap();
    assert!(mid.x >= from.x.min(to.x) && mid.x <= from.x.max(to.x));
    assert!(mid.y >= from.y.min(to.y) && mid.y <= from.y.max(to.y));
    assert!(mid != to);

    controller.tick(300).unwrap();
    assert!(!controller.is_animating());
    assert_eq!(controller.rect(slot, 300), Some(to));
    assert!(
        controller
            .frame(300)
            .all(|item| item.rect == controller.grid().item(item.slot).unwrap().rect())
    );
}

#[test]
fn controller_forwards_scroll_requests_once() {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 300, 0)));
    let grid = Grid::with_records(
        options(&viewport)
            .with_animation(Animation::DISABLED)
            .with_resize_debounce_ms(0),
        (0..200).map(|id| Tile { id, height: 100 }).collect(),
    )
    .unwrap();
    let mut controller = Controller::from_grid(grid);

    *viewport.lock().unwrap() = Viewport::scrolled(1000, 300, 1100);
    controller.on_scroll(16).unwrap();
    *viewport.lock().unwrap() = Viewport::scrolled(500, 300, 1100);
    controller.on_resize(32).unwrap();

    assert_eq!(controller.tick(48).unwrap(), Some(2200));
    assert_eq!(controller.tick(64).unwrap(), None);
}

#[test]
fn unbound_slots_are_not_drawn() {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 300, 0)));
    let grid = Grid::with_records(
        options(&viewport).with_animation(Animation::DISABLED),
        tiles(5),
    )
    .unwrap();
    let controller = Controller::from_grid(grid);
    assert!(controller.grid().items().len() > 5);
    assert_eq!(controller.frame(0).count(), 5);
    assert_eq!(controller.rect(controller.grid().items().len() - 1, 0), None);
}
