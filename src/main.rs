//! Sitedeck: one persistent tab per configured website.
//!
//! With the `gui` feature the binary opens the desktop window. Without it,
//! it runs a console session over the same catalog and state database,
//! useful for managing sites from a terminal.

use std::process::ExitCode;

#[cfg(feature = "gui")]
fn main() -> ExitCode {
    init_logging();
    match sitedeck::ui::webview_app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "gui"))]
fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match console::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(not(feature = "gui"))]
mod console {
    use std::error::Error;

    use sitedeck::app::{App, AppPaths, Embedder};
    use sitedeck::managers::site_catalog::SiteCatalogTrait;
    use sitedeck::managers::tab_manager::TabManagerTrait;
    use sitedeck::services::external_opener::SystemOpener;
    use sitedeck::surface::headless::{HeadlessHost, HeadlessSurfaceFactory};

    const USAGE: &str = "usage: sitedeck [list | add <name> <url> [icon] | remove <id> | move <id> <index> | select <id>]";

    pub fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
        let app = App::new(
            &AppPaths::platform_default(),
            Embedder {
                factory: HeadlessSurfaceFactory::new(),
                host: HeadlessHost::new(),
                opener: std::rc::Rc::new(SystemOpener),
            },
        )?;
        app.startup();

        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            [] | ["list"] => {}
            ["add", name, url] => {
                let id = app.catalog.add_site(name, url, None)?;
                println!("added {}", id);
            }
            ["add", name, url, icon] => {
                let id = app.catalog.add_site(name, url, Some(*icon))?;
                println!("added {}", id);
            }
            ["remove", id] => app.catalog.remove_site(id)?,
            ["move", id, index] => {
                let index: usize = index.parse().map_err(|_| format!("bad index '{}'", index))?;
                app.catalog.move_site(id, index)?;
            }
            ["select", id] => app.tab_manager.select_site(id)?,
            _ => return Err(USAGE.into()),
        }
        app.ctx.main_loop.run_pending();

        print_sites(&app);
        app.shutdown();
        Ok(())
    }

    fn print_sites(app: &App) {
        let tabs = app.tab_manager.tabs();
        if tabs.is_empty() {
            println!("no sites configured ({})", USAGE);
            return;
        }
        let active = app.tab_manager.active_index();
        for (i, tab) in tabs.iter().enumerate() {
            let marker = if i == active { "*" } else { " " };
            let site = tab.site();
            println!("{} {:>2}  {:<20} {}  [{}]", marker, i, site.name, site.url, site.id);
        }
    }
}
