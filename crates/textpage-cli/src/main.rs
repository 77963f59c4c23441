mod cli;
mod page_range;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use textpage::{Document, OpenOptions};

use cli::{Cli, Commands};
use page_range::parse_page_range;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn open(file: &Path, password: Option<String>) -> Result<Document, String> {
    let options = OpenOptions {
        user_password: password,
        ..OpenOptions::default()
    };
    Document::open_file(file, Some(options)).map_err(|e| e.to_string())
}

fn parse_point(expr: &str) -> Result<(f64, f64), String> {
    let (x, y) = expr
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{expr}'"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x '{x}'"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y '{y}'"))?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(format!("coordinates must be fractions in [0,1]: '{expr}'"));
    }
    Ok((x, y))
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Text {
            file,
            pages,
            normalize,
            password,
        } => {
            let doc = open(&file, password)?;
            let selected = parse_page_range(pages.as_deref(), doc.page_count())?;
            for (i, page) in selected.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", doc.page_text(normalize, *page));
            }
            Ok(())
        }

        Commands::Search {
            file,
            query,
            pages,
            case_sensitive,
            password,
        } => {
            let mut doc = open(&file, password)?;
            let selected = parse_page_range(pages.as_deref(), doc.page_count())?;
            let mut total = 0;
            for page in selected {
                let hits: Vec<_> = doc.search(&query, case_sensitive, page).to_vec();
                for r in &hits {
                    println!(
                        "page {}: {:.4} {:.4} {:.4} {:.4}",
                        page + 1,
                        r.x_min,
                        r.y_min,
                        r.x_max,
                        r.y_max
                    );
                }
                total += hits.len();
            }
            println!("{total} match(es)");
            Ok(())
        }

        Commands::Select {
            file,
            page,
            from,
            to,
            normalize,
            password,
        } => {
            let mut doc = open(&file, password)?;
            if page == 0 || page > doc.page_count() {
                return Err(format!("page {page} out of range"));
            }
            let page = page - 1;
            let (x0, y0) = parse_point(&from)?;
            let (x1, y1) = parse_point(&to)?;
            doc.set_begin_coordinate(x0, y0, page);
            if let Some(polygon) = doc.from_begin_to_coordinate(x1, y1, page) {
                for r in polygon {
                    println!(
                        "rect {:.4} {:.4} {:.4} {:.4}",
                        r.x_min, r.y_min, r.x_max, r.y_max
                    );
                }
            }
            println!("{}", doc.selected_text(normalize, page));
            Ok(())
        }

        Commands::Info { file, password } => {
            let doc = open(&file, password)?;
            println!("pages: {}", doc.page_count());
            for i in 0..doc.page_count() {
                if let Some(page) = doc.page(i) {
                    println!(
                        "page {}: {:.0} x {:.0} pt, {} words",
                        i + 1,
                        page.width(),
                        page.height(),
                        page.analysis().words().len()
                    );
                    for warning in page.warnings() {
                        println!("  {warning}");
                    }
                }
            }
            for warning in doc.warnings() {
                println!("{warning}");
            }
            Ok(())
        }
    }
}
