// Example: per-frame rects while an insert animates the grid.
use std::sync::{Arc, Mutex};

use masonry_grid::{Animation, Easing, GridOptions, ItemView, Record, Viewport};
use masonry_grid_adapter::Controller;

#[derive(Clone, Debug)]
struct Tile(u32);

impl Record for Tile {
    fn explicit_height(&self) -> Option<u32> {
        Some(80 + self.0 % 5 * 30)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 600, 0)));
    let options = GridOptions::new(
        {
            let viewport = Arc::clone(&viewport);
            move || *viewport.lock().unwrap()
        },
        |_view: &mut ItemView, _tile: &Tile| {},
    )
    .with_animation(Animation {
        enabled: true,
        duration_ms: 240,
        easing: Easing::EaseInOutCubic,
    });

    let mut c = Controller::new(options)?;
    c.grid_mut().load((0..40).map(Tile).collect())?;
    c.tick(0)?;

    let watched = c.grid().item_for_index(0).map(|v| v.slot());
    c.grid_mut().insert(Tile(1000))?;

    let mut now = 0;
    loop {
        now += 16;
        if let Some(offset) = c.tick(now)? {
            *viewport.lock().unwrap() = Viewport::scrolled(1000, 600, offset);
            c.on_scroll(now)?;
        }
        if let Some(slot) = watched {
            println!("t={now} slot={slot} rect={:?}", c.rect(slot, now));
        }
        if !c.is_animating() {
            break;
        }
    }
    println!("drawn={}", c.frame(now).count());
    Ok(())
}
