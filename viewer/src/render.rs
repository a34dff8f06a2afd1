use common::{Job, JobState, Record};

/// Limpia la pantalla y vuelve el cursor arriba: cada frame reemplaza al anterior.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const TITLE_WIDTH: usize = 60;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// Tabla completa de resultados. Misma entrada, misma salida.
pub fn render_table(rows: &[Record]) -> String {
    let headers = ["Last updated", "Title", "Rating", "Ratings", "Length", "Lectures", "URL"];

    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|r| {
            [
                r.last_updated.clone(),
                truncate(&r.title, TITLE_WIDTH),
                r.rating.clone(),
                r.ratings_count.clone(),
                r.length.clone(),
                r.lectures.clone(),
                r.url.clone(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

/// Línea de estado del job.
pub fn status_line(job: &Job) -> String {
    match job.state {
        JobState::Idle => "No hay ningún job en curso.".to_string(),
        JobState::Extracting | JobState::Enriching => {
            format!("[{}/{}] {}", job.processed, job.total, job.message)
        }
        JobState::Done => job.message.clone(),
        JobState::Error => format!(
            "Error: {}",
            job.error.as_deref().unwrap_or(job.message.as_str())
        ),
    }
}

/// Un frame completo: pantalla limpia, estado y tabla.
pub fn render_frame(status: &str, rows: &[Record]) -> String {
    let mut out = String::from(CLEAR_SCREEN);
    out.push_str(status);
    out.push('\n');
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(&render_table(rows));
    }
    out
}
