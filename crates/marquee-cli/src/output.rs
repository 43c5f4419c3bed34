use std::io::Write;

use marquee_core::{MovieDetail, MovieSummary};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the header line before the first page of results.
pub fn print_header(
    w: &mut dyn Write,
    query: &str,
    total_results: u32,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!("{} results for \"{}\"", total_results, query);
    if color.enabled() {
        writeln!(w, "{}", line.bold())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    writeln!(w)
}

/// Print newly aggregated items, numbered from `offset + 1`.
pub fn print_items(
    w: &mut dyn Write,
    items: &[MovieSummary],
    offset: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        let number = offset + i + 1;
        if color.enabled() {
            writeln!(
                w,
                "{:>3}. {} ({})  {}",
                number,
                item.title.bold(),
                item.year,
                item.imdb_id.dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{:>3}. {} ({})  {}",
                number, item.title, item.year, item.imdb_id
            )?;
        }
    }
    Ok(())
}

/// Print the running total after a page has been rendered.
pub fn print_footer(
    w: &mut dyn Write,
    shown: usize,
    total_results: u32,
    is_last_page: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = if is_last_page {
        format!("Showing all {} results", shown)
    } else {
        format!("Showing {} of {}", shown, total_results)
    };
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())
    } else {
        writeln!(w, "{}", line)
    }
}

/// Print a full movie record.
pub fn print_detail(
    w: &mut dyn Write,
    detail: &MovieDetail,
    favorite: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let star = if favorite { " ★" } else { "" };
    if color.enabled() {
        writeln!(
            w,
            "{} ({}){}",
            detail.title.bold(),
            detail.year,
            star.yellow()
        )?;
    } else {
        writeln!(w, "{} ({}){}", detail.title, detail.year, star)?;
    }
    writeln!(w, "{}  {}  {}", detail.rated, detail.runtime, detail.genre)?;
    writeln!(w, "Director: {}", detail.director)?;
    writeln!(w, "Actors:   {}", detail.actors)?;
    writeln!(w)?;
    writeln!(w, "{}", detail.plot)?;
    if let Some(poster) = &detail.poster {
        writeln!(w)?;
        if color.enabled() {
            writeln!(w, "{}", poster.dimmed())?;
        } else {
            writeln!(w, "{}", poster)?;
        }
    }
    Ok(())
}

/// Print the stored favorites.
pub fn print_favorites(
    w: &mut dyn Write,
    favorites: &[MovieDetail],
    color: ColorMode,
) -> std::io::Result<()> {
    if favorites.is_empty() {
        return writeln!(w, "No favorites yet");
    }
    for (i, detail) in favorites.iter().enumerate() {
        if color.enabled() {
            writeln!(
                w,
                "{:>3}. {} ({})  {}",
                i + 1,
                detail.title.bold(),
                detail.year,
                detail.imdb_id.dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{:>3}. {} ({})  {}",
                i + 1,
                detail.title,
                detail.year,
                detail.imdb_id
            )?;
        }
    }
    Ok(())
}
