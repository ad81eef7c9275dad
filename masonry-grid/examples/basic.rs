// Example: lay out a static dataset and scroll through it.
use std::sync::{Arc, Mutex};

use masonry_grid::{Grid, GridOptions, ItemView, Record, Viewport};

#[derive(Clone, Debug)]
struct Photo {
    id: u32,
    aspect: f32,
}

impl Record for Photo {
    fn explicit_aspect_ratio(&self) -> Option<f32> {
        Some(self.aspect)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let viewport = Arc::new(Mutex::new(Viewport::scrolled(1000, 600, 0)));
    let photos: Vec<Photo> = (0..500)
        .map(|id| Photo {
            id,
            aspect: [0.75, 1.0, 1.5][id as usize % 3],
        })
        .collect();

    let options = GridOptions::new(
        {
            let viewport = Arc::clone(&viewport);
            move || *viewport.lock().unwrap()
        },
        |view: &mut ItemView, photo: &Photo| {
            // A real binder would fill widgets here; heights come from the aspect ratio.
            let _ = (view.slot(), photo.id);
        },
    )
    .with_spacing(8, 8);
    let mut grid = Grid::with_records(options, photos)?;

    let g = grid.geometry();
    println!(
        "columns={} item_width={} left_offset={}",
        g.column_count, g.item_width, g.left_offset
    );
    println!("pool={} window={:?}", grid.items().len(), grid.window());
    println!("content_height={}", grid.content_height());

    for (step, offset) in [2_000u64, 8_000, 20_000].into_iter().enumerate() {
        *viewport.lock().unwrap() = Viewport::scrolled(1000, 600, offset);
        grid.on_scroll(16 * (step as u64 + 1))?;
        let visible = grid.items().iter().filter(|v| v.is_visible()).count();
        println!(
            "offset={offset} window={:?} visible_views={visible}",
            grid.window()
        );
    }
    Ok(())
}
