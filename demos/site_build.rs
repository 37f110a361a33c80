//! A pretend site generator: reads the site config, runs the build hooks and renders a
//! Co fence the way a documentation page would.
//!
//! cargo run --example site_build -- demos/site.json demos/sample.co

use std::env;
use std::fs;
use std::path::PathBuf;

use cohl::site::{Deferred, HookOutcome, Site, SiteConfig, SiteContext, configure_with};
use cohl::{COHL_CSS, Registry, Theme, highlight_fence};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <site.json> <file.co>", args[0]);
        std::process::exit(1);
    }

    let config = SiteConfig::load_from_file(&args[1])?;
    let mut site = Site {
        on_before_build: Some(Box::new(|files: &[PathBuf]| {
            let count = files.len();
            HookOutcome::Wait(Deferred::new(move || {
                eprintln!("preparing {count} pages");
                Ok(())
            }))
        })),
        ..Default::default()
    };
    let mut registry = Registry::default();
    configure_with(
        SiteContext {
            site: &mut site,
            hljs: &mut registry,
        },
        &config,
    )?;

    let pages = vec![PathBuf::from(&args[2])];
    site.run_before_build(&pages)?;

    let code = fs::read_to_string(&args[2])?;
    let html = highlight_fence(&registry, "co,linenos,hl_lines=1", &code)?;
    let css = Theme::default().generate_css("hljs-");
    println!("<!-- written to {} -->", site.outdir.display());
    println!("<style>\n{COHL_CSS}{css}</style>\n{html}");

    site.run_after_build(&pages)?;
    Ok(())
}
