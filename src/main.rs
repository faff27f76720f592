//! Mini-Book CLI: paginate an HTML fragment and print the page stats.
//! The main interface is through WASM bindings.
//!
//! Usage: `mini-book <file.html> [width height font_size]`

use mini_book::{Pager, PageGeometry, PagerConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("mini-book: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let Some(path) = args.first() else {
        return Err("usage: mini-book <file.html> [width height font_size]".into());
    };
    let geometry = parse_geometry(&args[1..])?;

    let markup =
        std::fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))?;
    let mut pager = Pager::from_markup(&markup, PagerConfig::new(geometry));
    pager.update_layout().map_err(|err| err.to_string())?;

    let stats: Vec<_> = pager.pages().iter().map(|page| page.stats).collect();
    serde_json::to_string_pretty(&stats).map_err(|err| err.to_string())
}

fn parse_geometry(args: &[String]) -> Result<PageGeometry, String> {
    let defaults = PageGeometry::default();
    let values = args
        .iter()
        .map(|arg| {
            arg.parse::<f64>()
                .map_err(|_| format!("not a number: {arg}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [] => Ok(defaults),
        [width, height] => Ok(PageGeometry::new(*width, *height, defaults.font_size)),
        [width, height, font_size] => Ok(PageGeometry::new(*width, *height, *font_size)),
        _ => Err("expected: [width height font_size]".into()),
    }
}
