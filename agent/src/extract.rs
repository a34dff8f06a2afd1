use common::{dedup_by_url, normalize_space, Record};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::{collections::HashMap, sync::LazyLock};
use tracing::{debug, warn};
use url::Url;

/* --------- Clasificación de tags ("428 ratings", "3.5 total hours", ...) --------- */

static TAG_RATINGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bratings\b").expect("regex ratings"));
static TAG_TOTAL_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btotal hours\b").expect("regex total hours"));
static TAG_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(hours?|minutes?)\b").expect("regex duración"));
static TAG_LECTURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blectures\b").expect("regex lectures"));

/* --------- Escaneo de texto cuando los selectores no encuentran nada --------- */

static SCAN_RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([0-5]\.\d)\s+out of 5").expect("regex rating"));
static SCAN_RATINGS_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d][\d,.]*K?\s+ratings)").expect("regex ratings count"));
static SCAN_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d][\d.]*\s+total (?:hours?|mins?))").expect("regex length")
});
static SCAN_LECTURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\s+lectures)").expect("regex lectures"));

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagFields {
    pub ratings_count: String,
    pub length: String,
    pub lectures: String,
}

/// Reparte los tags de una tarjeta entre ratings / duración / clases.
/// Si hay varios candidatos a duración gana el explícito "total hours".
pub fn parse_tag_text<S: AsRef<str>>(tags: &[S]) -> TagFields {
    let mut out = TagFields::default();

    for tag in tags {
        let text = normalize_space(tag.as_ref());

        if TAG_RATINGS.is_match(&text) {
            out.ratings_count = text.clone();
        }

        let explicit_total = TAG_TOTAL_HOURS.is_match(&text);
        if (explicit_total || TAG_DURATION.is_match(&text))
            && (out.length.is_empty() || explicit_total)
        {
            out.length = text.clone();
        }

        if TAG_LECTURES.is_match(&text) {
            out.lectures = text;
        }
    }

    out
}

/* --------- Reglas de extracción declarativas --------- */

#[derive(Debug, Clone, Copy)]
pub enum TagKind {
    RatingsCount,
    Length,
    Lectures,
}

/// Un intento de sacar un campo. Se prueban en orden y gana el primero
/// que devuelve algo no vacío.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Texto del primer elemento que matchea el selector
    Text(&'static str),
    /// Atributo del primer elemento que matchea el selector
    Attr(&'static str, &'static str),
    /// Valor ya clasificado desde la lista de tags
    Tag(TagKind),
    /// Grupo 1 de la regex sobre todo el texto de la tarjeta
    Scan(&'static LazyLock<Regex>),
}

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Title,
    Url,
    Rating,
    RatingsCount,
    Length,
    Lectures,
}

impl Field {
    fn assign(self, record: &mut Record, value: String) {
        match self {
            Field::Title => record.title = value,
            Field::Url => record.url = value,
            Field::Rating => record.rating = value,
            Field::RatingsCount => record.ratings_count = value,
            Field::Length => record.length = value,
            Field::Lectures => record.lectures = value,
        }
    }
}

#[derive(Debug)]
pub struct FieldRule {
    pub field: Field,
    pub probes: &'static [Probe],
}

/// Describe dónde están los datos en una página concreta. Cambiar de
/// sitio es cambiar el perfil, no el código de `extract`.
#[derive(Debug)]
pub struct ExtractionProfile {
    pub container: &'static str,
    pub tag_items: &'static str,
    pub fields: &'static [FieldRule],
}

pub static COURSE_CARDS: ExtractionProfile = ExtractionProfile {
    container: r#"section[class*="vertical-card-module--card"], [data-purpose="course-card"]"#,
    tag_items: r#"ul[class*="tag-list-module--list"] li"#,
    fields: &[
        FieldRule {
            field: Field::Url,
            probes: &[
                Probe::Attr(r#"h2 a[href*="/course/"]"#, "href"),
                Probe::Attr(r#"h3 a[href*="/course/"]"#, "href"),
                Probe::Attr(r#"a[href*="/course/"]"#, "href"),
            ],
        },
        FieldRule {
            field: Field::Title,
            probes: &[
                Probe::Text(r#"h2 a[href*="/course/"]"#),
                Probe::Text(r#"div[class*="card-title-module--clipped"]"#),
                Probe::Text("h3"),
            ],
        },
        FieldRule {
            field: Field::Rating,
            probes: &[
                Probe::Text(r#"[data-purpose="rating-number"]"#),
                Probe::Scan(&SCAN_RATING),
            ],
        },
        FieldRule {
            field: Field::RatingsCount,
            probes: &[
                Probe::Tag(TagKind::RatingsCount),
                Probe::Scan(&SCAN_RATINGS_COUNT),
            ],
        },
        FieldRule {
            field: Field::Length,
            probes: &[Probe::Tag(TagKind::Length), Probe::Scan(&SCAN_LENGTH)],
        },
        FieldRule {
            field: Field::Lectures,
            probes: &[Probe::Tag(TagKind::Lectures), Probe::Scan(&SCAN_LECTURES)],
        },
    ],
};

/// Selectores de los probes de un perfil, parseados una sola vez por documento.
/// Los inválidos se avisan acá y después simplemente no matchean.
struct CompiledSelectors(HashMap<&'static str, Selector>);

impl CompiledSelectors {
    fn for_profile(profile: &ExtractionProfile) -> Self {
        let mut map = HashMap::new();
        for probe in profile.fields.iter().flat_map(|rule| rule.probes) {
            let css = match probe {
                Probe::Text(css) | Probe::Attr(css, _) => *css,
                Probe::Tag(_) | Probe::Scan(_) => continue,
            };
            if map.contains_key(css) {
                continue;
            }
            match Selector::parse(css) {
                Ok(sel) => {
                    map.insert(css, sel);
                }
                Err(e) => debug!("selector inválido {:?}: {:?}", css, e),
            }
        }
        Self(map)
    }

    fn first_match<'a>(&self, card: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
        self.0.get(css).and_then(|sel| card.select(sel).next())
    }
}

/// Lo que una tarjeta ofrece a los probes.
struct CardView<'a> {
    card: ElementRef<'a>,
    text: String,
    tags: TagFields,
    selectors: &'a CompiledSelectors,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl Probe {
    fn apply(&self, view: &CardView<'_>) -> Option<String> {
        match self {
            Probe::Text(css) => view.selectors.first_match(&view.card, css)
                .map(|el| normalize_space(&el.text().collect::<Vec<_>>().join(" ")))
                .and_then(non_empty),
            Probe::Attr(css, attr) => view.selectors.first_match(&view.card, css)
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
                .and_then(non_empty),
            Probe::Tag(kind) => {
                let v = match kind {
                    TagKind::RatingsCount => &view.tags.ratings_count,
                    TagKind::Length => &view.tags.length,
                    TagKind::Lectures => &view.tags.lectures,
                };
                non_empty(v.clone())
            }
            Probe::Scan(re) => re
                .captures(&view.text)
                .and_then(|c| c.get(1))
                .map(|m| normalize_space(m.as_str()))
                .and_then(non_empty),
        }
    }
}

fn resolve_url(href: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

/// Escanea el documento una vez y devuelve los registros deduplicados por
/// url, en el orden en que aparecen. Un campo que no se encuentra queda "";
/// una tarjeta sin url se descarta porque no hay forma de identificarla.
pub fn extract(html: &str, base: Option<&Url>, profile: &ExtractionProfile) -> Vec<Record> {
    let document = Html::parse_document(html);

    let container = match Selector::parse(profile.container) {
        Ok(sel) => sel,
        Err(e) => {
            warn!("selector de contenedor inválido: {:?}", e);
            return Vec::new();
        }
    };
    let tag_items = Selector::parse(profile.tag_items).ok();
    let selectors = CompiledSelectors::for_profile(profile);

    let mut records = Vec::new();

    for card in document.select(&container) {
        let tags: Vec<String> = match &tag_items {
            Some(sel) => card
                .select(sel)
                .map(|li| normalize_space(&li.text().collect::<Vec<_>>().join(" ")))
                .filter(|t| !t.is_empty())
                .collect(),
            None => Vec::new(),
        };

        let view = CardView {
            card,
            text: normalize_space(&card.text().collect::<Vec<_>>().join(" ")),
            tags: parse_tag_text(&tags),
            selectors: &selectors,
        };

        let mut record = Record::default();
        for rule in profile.fields {
            let value = rule
                .probes
                .iter()
                .find_map(|p| p.apply(&view))
                .unwrap_or_default();
            rule.field.assign(&mut record, value);
        }

        if record.url.is_empty() {
            debug!("tarjeta sin url, se descarta");
            continue;
        }
        record.url = resolve_url(&record.url, base);
        records.push(record);
    }

    dedup_by_url(records)
}
