use anyhow::Result;

use thoughtweave::session::{DailyView, Session};

use super::report_write;

/// Generate a thought of the day, optionally keeping it as a favorite.
pub async fn daily(session: &Session, exclude: Option<&str>, favorite: bool) -> Result<()> {
    let daily = match session.daily_summary(exclude).await? {
        DailyView::Ready(daily) => daily,
        DailyView::Unavailable => {
            println!("Add a few tagged thoughts first.");
            return Ok(());
        }
    };

    println!("Theme: #{}\n", daily.theme);
    println!("{}", daily.summary);

    if favorite {
        match session.favorite(&daily).await? {
            Some(committed) => {
                report_write(&committed.write);
                println!("\nSaved to favorites ({}).", committed.value.id);
            }
            None => println!("\nAlready in favorites."),
        }
    } else if session.is_favorited(&daily) {
        println!("\n(already in favorites)");
    }
    Ok(())
}

/// List kept summaries, newest first.
pub fn favorites(session: &Session) -> Result<()> {
    let favorites = session.favorites();
    if favorites.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }

    for favorite in &favorites {
        println!("  #{} ({})", favorite.theme, favorite.favorited_at);
        println!("     {}", favorite.summary);
        println!("     id: {}", favorite.id);
        println!();
    }
    Ok(())
}

pub async fn unfavorite(session: &Session, id: &str) -> Result<()> {
    let committed = session.unfavorite(id).await?;
    report_write(&committed.write);
    if committed.value {
        println!("Removed favorite {id}.");
    } else {
        println!("No favorite with id {id}.");
    }
    Ok(())
}
