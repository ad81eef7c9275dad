// Example: pull records page by page from a data source and watch the grid events.
use std::sync::{Arc, Mutex};

use masonry_grid::{Fetch, Grid, GridEvent, GridOptions, ItemView, Record, Viewport};

#[derive(Clone, Debug)]
struct Card {
    id: usize,
}

impl Record for Card {
    fn explicit_height(&self) -> Option<u32> {
        Some(120 + (self.id as u32 * 37) % 160)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const TOTAL: usize = 300;

    let viewport = Arc::new(Mutex::new(Viewport::scrolled(800, 500, 0)));
    let options = GridOptions::new(
        {
            let viewport = Arc::clone(&viewport);
            move || *viewport.lock().unwrap()
        },
        |_view: &mut ItemView, _card: &Card| {},
    )
    .with_data_block_size(60)
    .with_on_event(Some(|grid: &Grid<Card>, event: &GridEvent<Card>| match event {
        GridEvent::DataLoadEnd { direction, window } => {
            println!(
                "loaded {direction:?}: window={window:?} cached={}",
                grid.len()
            );
        }
        GridEvent::EndOfData { len } => println!("end of data at {len}"),
        GridEvent::Ready => println!("ready"),
        _ => {}
    }));

    // A page shorter than requested marks the end of the data.
    let source = |start: usize, count: usize| {
        let end = (start + count).min(TOTAL);
        println!("fetch start={start} count={count}");
        Fetch::ready((start..end).map(|id| Card { id }).collect())
    };
    let mut grid = Grid::with_source(options, source)?;

    let mut now = 0;
    while !grid.is_end_of_data() && now < 10_000 {
        now += 16;
        let bottom = grid.content_height();
        *viewport.lock().unwrap() = Viewport::scrolled(800, 500, bottom.saturating_sub(500));
        grid.on_scroll(now)?;
    }
    println!("records={} window={:?}", grid.len(), grid.window());
    Ok(())
}
