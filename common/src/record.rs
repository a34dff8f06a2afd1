use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Un item scrapeado (un curso de la página de búsqueda).
///
/// Todos los campos son strings copiados tal cual; lo que falta es "",
/// nunca null, así el resto del pipeline no tiene que chequear ausencias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Record {
    pub title: String,
    /// Clave natural para deduplicar
    pub url: String,
    pub rating: String,
    pub ratings_count: String,
    pub length: String,
    pub lectures: String,

    /// Campo de enriquecimiento (fase 2). "" si no se pudo obtener.
    pub last_updated: String,
}

impl Record {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Colapsa espacios internos y recorta.
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deduplica por `url` exacta, quedándose con la primera aparición.
pub fn dedup_by_url(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

/// Ordena por `last_updated` (formato yyyy-mm-dd ordena bien como string).
/// Las fechas vacías quedan siempre al final, en cualquier sentido.
pub fn sort_by_last_updated(records: &mut [Record], order: SortOrder) {
    records.sort_by(|a, b| {
        match (a.last_updated.is_empty(), b.last_updated.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let cmp = a.last_updated.cmp(&b.last_updated);
                match order {
                    SortOrder::Ascending => cmp,
                    SortOrder::Descending => cmp.reverse(),
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(url: &str, last_updated: &str) -> Record {
        Record {
            url: url.to_string(),
            last_updated: last_updated.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn dedup_by_url_conserva_primera_aparicion_en_orden() {
        let mut first_a = Record::with_url("a");
        first_a.title = "primero".to_string();
        let mut second_a = Record::with_url("a");
        second_a.title = "repetido".to_string();

        let out = dedup_by_url(vec![first_a, Record::with_url("b"), second_a]);

        let urls: Vec<&str> = out.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
        assert_eq!(out[0].title, "primero");
    }

    #[test]
    fn dedup_by_url_sin_repetidos_no_cambia_nada() {
        let input = vec![Record::with_url("x"), Record::with_url("y")];
        assert_eq!(dedup_by_url(input.clone()), input);
    }

    #[test]
    fn normalize_space_colapsa_y_recorta() {
        assert_eq!(normalize_space("  Rust \n\t para   todos "), "Rust para todos");
        assert_eq!(normalize_space(""), "");
    }

    #[test]
    fn record_deserializa_campos_faltantes_como_vacios() {
        let r: Record = serde_json::from_str(r#"{"url":"https://x/course/a"}"#).unwrap();
        assert_eq!(r.url, "https://x/course/a");
        assert_eq!(r.title, "");
        assert_eq!(r.last_updated, "");
    }

    #[test]
    fn record_serializa_en_camel_case() {
        let mut r = Record::with_url("u");
        r.ratings_count = "428 ratings".to_string();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["ratingsCount"], "428 ratings");
        assert_eq!(v["lastUpdated"], "");
    }

    #[test]
    fn sort_por_fecha_deja_vacios_al_final() {
        let mut rows = vec![
            dated("a", ""),
            dated("b", "2024-03-01"),
            dated("c", "2025-01-01"),
            dated("d", ""),
        ];

        sort_by_last_updated(&mut rows, SortOrder::Descending);
        let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "b", "a", "d"]);

        sort_by_last_updated(&mut rows, SortOrder::Ascending);
        let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c", "a", "d"]);
    }
}
