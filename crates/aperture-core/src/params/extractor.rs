//! Structured photo/video attribute extraction.
//!
//! Each rule is an independent unit: a primary pattern, an optional context
//! pattern that must match the full text, and a writer for its fields. Rules
//! never short-circuit each other, so a bare `NNmm` token next to a filter
//! keyword writes both the focal length and the filter diameter. The one
//! exception is a single focal length, which never overwrites a range.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::trace;

use crate::params::models::{fields, ExtractedParams, ParamValue};

lazy_static! {
    static ref APERTURE: Regex =
        Regex::new(r"(?i)\bf(?:\s*/\s*)?(\d{1,2}(?:[.,]\d{1,2})?)\b").expect("aperture pattern");
    static ref FOCAL_RANGE: Regex =
        Regex::new(r"(?i)\b(\d{1,3})\s*-\s*(\d{1,4})\s*mm\b").expect("focal range pattern");
    static ref FOCAL_SINGLE: Regex =
        Regex::new(r"(?i)(?:^|[^\d\-.,])(\d{1,4})\s*mm\b").expect("focal pattern");
    static ref FILTER_DIAMETER: Regex =
        Regex::new(r"(?i)(?:^|[^\d\-.,])(\d{2})\s*mm\b").expect("filter diameter pattern");
    static ref FILTER_CONTEXT: Regex = Regex::new(
        r"(?i)\b(filtr\w*|filter\w*|uv|cpl|nd\d*|polaryzac\w*|polaryzator\w*|połówkow\w*|polowkow\w*|szary|szare|redukcj\w*|step[\s-]?up|step[\s-]?down)\b"
    )
    .expect("filter context pattern");
    static ref RESOLUTION: Regex = Regex::new(
        r"(?i)\b(8k|6k|5[.,]?7k|4k|2[.,]7k|uhd|full\s*hd|fhd|2160p|1080p|720p)\b"
    )
    .expect("resolution pattern");
    static ref FPS: Regex =
        Regex::new(r"(?i)\b(\d{2,3})\s*(?:fps|kl\.?\s*/\s*s|klatek)\b").expect("fps pattern");
    static ref SENSOR: Regex = Regex::new(
        r"(?i)\b(full\s*frame|pełn\w*\s+klatk\w*|peln\w*\s+klatk\w*|aps-?c|aps-?h|micro\s*4/3|m4/3|mft|średni\w*\s+format\w*|sredni\w*\s+format\w*|medium\s+format|1\s*cal\w*)\b"
    )
    .expect("sensor pattern");
    static ref MOUNT: Regex = Regex::new(
        r"(?i)\b(rf-?s|rf|ef-?s|ef-?m|ef|e[\s-]?mount|sony\s+e|fe|nikon\s+z|z[\s-]?mount|nikon\s+f|f[\s-]?mount|x[\s-]?mount|fuji(?:film)?\s+x|l[\s-]?mount|micro\s*4/3|m4/3|mft|pl[\s-]?mount)\b"
    )
    .expect("mount pattern");
    static ref MEGAPIXELS: Regex = Regex::new(
        r"(?i)\b(\d{1,3}(?:[.,]\d{1,2})?)\s*(?:mpx|mpix|mp|megapiksel\w*|megapixel\w*|mln\s+pikseli)\b"
    )
    .expect("megapixel pattern");
    /// Any focal token, single or range, used for span stripping and presence checks.
    static ref FOCAL_SPAN: Regex = Regex::new(
        r"(?i)\b\d{1,4}(?:[.,]\d)?(?:\s*-\s*\d{1,4}(?:[.,]\d)?)?\s*mm\b"
    )
    .expect("focal span pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern");
}

type FieldWriter = fn(&Captures<'_>, &mut ExtractedParams);

/// One extractor: primary pattern, optional full-text context gate, field writer.
pub struct ExtractorRule {
    name: &'static str,
    pattern: &'static Regex,
    context: Option<&'static Regex>,
    write: FieldWriter,
}

impl ExtractorRule {
    fn new(name: &'static str, pattern: &'static Regex, write: FieldWriter) -> Self {
        Self {
            name,
            pattern,
            context: None,
            write,
        }
    }

    fn gated(mut self, context: &'static Regex) -> Self {
        self.context = Some(context);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, text: &str, params: &mut ExtractedParams) -> bool {
        if let Some(context) = self.context {
            if !context.is_match(text) {
                return false;
            }
        }
        match self.pattern.captures(text) {
            Some(captures) => {
                (self.write)(&captures, params);
                true
            }
            None => false,
        }
    }
}

/// Ordered list of independent extractor rules.
pub struct ParameterExtractor {
    rules: Vec<ExtractorRule>,
}

impl ParameterExtractor {
    pub fn new() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }

    /// Apply every rule in order; each rule commits its fields only when it matches.
    pub fn extract(&self, text: &str) -> ExtractedParams {
        let text = text.trim();
        let mut params = ExtractedParams::new();
        for rule in &self.rules {
            if rule.apply(text, &mut params) {
                trace!(rule = rule.name, "parameter rule fired");
            }
        }
        params
    }

    /// Remove every parameter-shaped span (aperture, focal, resolution, fps,
    /// sensor, mount, megapixels), independent of which fields [`extract`](Self::extract)
    /// would actually write.
    pub fn strip_matched_spans(&self, text: &str) -> String {
        let mut residual = text.trim().to_string();
        for pattern in Self::strip_patterns() {
            residual = pattern.replace_all(&residual, " ").into_owned();
        }
        WHITESPACE.replace_all(residual.trim(), " ").into_owned()
    }

    /// True when any structured-parameter pattern occurs anywhere in the text.
    pub fn has_structured_params(&self, text: &str) -> bool {
        [
            &*APERTURE,
            &*FOCAL_SPAN,
            &*RESOLUTION,
            &*FPS,
            &*SENSOR,
            &*MOUNT,
        ]
        .iter()
        .any(|pattern| pattern.is_match(text))
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(ExtractorRule::name)
    }

    fn strip_patterns() -> [&'static Regex; 7] {
        [
            &*APERTURE,
            &*FOCAL_SPAN,
            &*RESOLUTION,
            &*FPS,
            &*SENSOR,
            &*MOUNT,
            &*MEGAPIXELS,
        ]
    }

    fn default_rules() -> Vec<ExtractorRule> {
        vec![
            ExtractorRule::new("aperture", &APERTURE, write_aperture),
            ExtractorRule::new("focal_range", &FOCAL_RANGE, write_focal_range),
            ExtractorRule::new("focal_single", &FOCAL_SINGLE, write_focal_single),
            ExtractorRule::new("filter_diameter", &FILTER_DIAMETER, write_filter_diameter)
                .gated(&FILTER_CONTEXT),
            ExtractorRule::new("resolution", &RESOLUTION, write_resolution),
            ExtractorRule::new("fps", &FPS, write_fps),
            ExtractorRule::new("sensor", &SENSOR, write_sensor),
            ExtractorRule::new("mount", &MOUNT, write_mount),
            ExtractorRule::new("megapixels", &MEGAPIXELS, write_megapixels),
        ]
    }
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn capture_int(captures: &Captures<'_>, group: usize) -> Option<i64> {
    captures.get(group)?.as_str().parse().ok()
}

fn capture_decimal(captures: &Captures<'_>, group: usize) -> Option<f64> {
    captures.get(group)?.as_str().replace(',', ".").parse().ok()
}

fn compact_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn write_aperture(captures: &Captures<'_>, params: &mut ExtractedParams) {
    if let Some(value) = captures.get(1) {
        let value = value.as_str().replace(',', ".");
        params.insert(fields::APERTURE, ParamValue::Text(format!("f/{value}")));
    }
}

fn write_focal_range(captures: &Captures<'_>, params: &mut ExtractedParams) {
    if let (Some(a), Some(b)) = (capture_int(captures, 1), capture_int(captures, 2)) {
        params.insert(fields::FOCAL_LENGTH_MIN, a.min(b));
        params.insert(fields::FOCAL_LENGTH_MAX, a.max(b));
    }
}

fn write_focal_single(captures: &Captures<'_>, params: &mut ExtractedParams) {
    // "70 - 200mm" also matches as a bare "200mm".
    if params.contains(fields::FOCAL_LENGTH_MAX) {
        return;
    }
    if let Some(length) = capture_int(captures, 1) {
        params.insert(fields::FOCAL_LENGTH_MIN, length);
        params.insert(fields::FOCAL_LENGTH_MAX, length);
    }
}

fn write_filter_diameter(captures: &Captures<'_>, params: &mut ExtractedParams) {
    if let Some(diameter) = capture_int(captures, 1) {
        params.insert(fields::FILTER_DIAMETER, diameter);
    }
}

fn write_resolution(captures: &Captures<'_>, params: &mut ExtractedParams) {
    let Some(raw) = captures.get(1) else { return };
    let normalized = match compact_key(raw.as_str()).replace(',', ".").as_str() {
        "8k" => "8K",
        "6k" => "6K",
        "5.7k" | "57k" => "5.7K",
        "4k" | "uhd" | "2160p" => "4K",
        "2.7k" => "2.7K",
        "fullhd" | "fhd" | "1080p" => "Full HD",
        "720p" => "HD",
        _ => return,
    };
    params.insert(fields::RESOLUTION, normalized);
}

fn write_fps(captures: &Captures<'_>, params: &mut ExtractedParams) {
    if let Some(fps) = capture_int(captures, 1) {
        params.insert(fields::FPS, fps);
    }
}

fn write_sensor(captures: &Captures<'_>, params: &mut ExtractedParams) {
    let Some(raw) = captures.get(1) else { return };
    let key = compact_key(raw.as_str());
    let normalized = if key.starts_with("full") || key.starts_with("pełn") || key.starts_with("peln")
    {
        "Full Frame"
    } else if key == "apsc" {
        "APS-C"
    } else if key == "apsh" {
        "APS-H"
    } else if matches!(key.as_str(), "micro4/3" | "m4/3" | "mft") {
        "Micro 4/3"
    } else if key.starts_with("średni") || key.starts_with("sredni") || key.starts_with("medium") {
        "Medium Format"
    } else if key.starts_with("1cal") {
        "1\""
    } else {
        return;
    };
    params.insert(fields::SENSOR_SIZE, normalized);
}

fn write_mount(captures: &Captures<'_>, params: &mut ExtractedParams) {
    let Some(raw) = captures.get(1) else { return };
    let normalized = match compact_key(raw.as_str()).as_str() {
        "rfs" => "Canon RF-S",
        "rf" => "Canon RF",
        "efs" => "Canon EF-S",
        "efm" => "Canon EF-M",
        "ef" => "Canon EF",
        "emount" | "sonye" | "fe" => "Sony E",
        "nikonz" | "zmount" => "Nikon Z",
        "nikonf" | "fmount" => "Nikon F",
        "xmount" | "fujix" | "fujifilmx" => "Fujifilm X",
        "lmount" => "L-Mount",
        "micro4/3" | "m4/3" | "mft" => "Micro 4/3",
        "plmount" => "PL",
        _ => return,
    };
    params.insert(fields::MOUNT, normalized);
}

fn write_megapixels(captures: &Captures<'_>, params: &mut ExtractedParams) {
    if let Some(megapixels) = capture_decimal(captures, 1) {
        params.insert(fields::MEGAPIXELS, ParamValue::number(megapixels));
    }
}
