use regex::Regex;
use std::sync::LazyLock;

static MM_YYYY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{4})$").expect("regex MM/YYYY")
});

static MONTH_YYYY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+(\d{4})$").expect("regex Month YYYY")
});

/// Nombre (o abreviatura) de mes en inglés -> número con dos dígitos.
fn month_number(name: &str) -> Option<&'static str> {
    let m = match name.to_ascii_lowercase().as_str() {
        "january" | "jan" => "01",
        "february" | "feb" => "02",
        "march" | "mar" => "03",
        "april" | "apr" => "04",
        "may" => "05",
        "june" | "jun" => "06",
        "july" | "jul" => "07",
        "august" | "aug" => "08",
        "september" | "sep" => "09",
        "october" | "oct" => "10",
        "november" | "nov" => "11",
        "december" | "dec" => "12",
        _ => return None,
    };
    Some(m)
}

/// Convierte una fecha libre a `YYYY-MM-01`.
///
/// - "12/2025"      -> "2025-12-01"
/// - "January 2025" -> "2025-01-01"
/// - cualquier otra cosa se devuelve tal cual (recortada)
pub fn canonical_date(raw: &str) -> String {
    let s = raw.trim();

    if let Some(caps) = MM_YYYY.captures(s) {
        return format!("{}-{:0>2}-01", &caps[2], &caps[1]);
    }

    if let Some(caps) = MONTH_YYYY.captures(s) {
        if let Some(month) = month_number(&caps[1]) {
            return format!("{}-{}-01", &caps[2], month);
        }
    }

    s.to_string()
}
