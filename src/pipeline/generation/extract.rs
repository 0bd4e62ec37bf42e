//! Heuristic (actor, action, object, format, modifiers) extraction.
//!
//! The extractor works on word tokens and small closed word lists: modal
//! verbs locate the main verb, stop words end the object phrase, and the
//! remaining prepositional phrases become modifiers, a target file format,
//! or a trailing condition. It is deliberately rule-based so its behavior
//! can be pinned by a fixed corpus of sentences.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'’/_+.#%-]*[\p{L}\p{N}%]|[\p{L}\p{N}]").unwrap()
});

const SINGLE_MODALS: &[&str] = &[
    "must", "shall", "should", "will", "can", "could", "may", "might", "would",
];
const MODALS_BEFORE_TO: &[&str] = &["need", "needs", "has", "have", "ought"];
const COPULA_MODALS: &[&str] = &["required", "expected", "able", "supposed"];
const SKIPPABLE: &[&str] = &[
    "not", "never", "also", "always", "only", "then", "still", "automatically", "easily",
    "securely", "quickly", "immediately", "periodically", "directly",
];
const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "their", "his", "her", "its", "our",
    "your", "my", "all", "each", "every", "any", "some",
];
const STOP_WORDS: &[&str] = &[
    "to", "with", "using", "via", "through", "by", "for", "from", "in", "into", "on", "onto",
    "at", "within", "when", "whenever", "while", "during", "before", "after", "if", "unless",
    "until", "once", "upon", "so", "that", "which", "who", "where", "as", "per", "without",
    "across", "over", "under", "between", "than", "of",
];
const CONDITION_WORDS: &[&str] = &[
    "when", "whenever", "while", "during", "before", "after", "if", "unless", "until", "once",
    "upon", "within",
];
const HELPER_VERBS: &[&str] = &["allow", "enable", "permit", "let", "help"];
const ABILITY_HELPERS: &[&str] = &["provide", "give", "offer", "support"];
const ABILITY_NOUNS: &[&str] = &[
    "ability", "option", "capability", "possibility", "means", "way", "functionality",
];
const PARTICLE_VERBS: &[&str] = &[
    "log", "sign", "set", "back", "check", "look", "roll", "shut", "turn", "opt", "clean",
    "fill", "pick", "print", "scale", "top", "follow",
];
const PARTICLES: &[&str] = &["in", "out", "up", "down", "off", "on", "back", "over"];
const COMMON_ACTIONS: &[&str] = &[
    "create", "read", "update", "delete", "view", "edit", "manage", "generate", "send",
    "receive", "display", "export", "import", "upload", "download", "search", "filter", "sort",
    "validate", "verify", "authenticate", "authorize", "encrypt", "store", "save", "track",
    "monitor", "notify", "calculate", "process", "approve", "reject", "submit", "schedule",
    "sync", "restore", "configure", "integrate", "reset", "register", "login", "access",
    "archive", "print", "share", "assign", "review", "report",
];
const IRREGULAR_PARTICIPLES: &[(&str, &str)] = &[
    ("sent", "send"),
    ("kept", "keep"),
    ("shown", "show"),
    ("written", "write"),
    ("built", "build"),
    ("done", "do"),
    ("made", "make"),
    ("given", "give"),
    ("taken", "take"),
    ("hidden", "hide"),
    ("held", "hold"),
    ("paid", "pay"),
    ("sold", "sell"),
    ("found", "find"),
    ("read", "read"),
    ("run", "run"),
    ("set", "set"),
    ("put", "put"),
    ("logged", "log"),
];
/// Stems that lost a silent "e" when "-ed" was added ("stored" → "stor").
const E_RESTORING_SUFFIXES: &[&str] = &[
    "at", "iz", "is", "ys", "ur", "or", "iv", "av", "ov", "ag", "ir", "us", "od", "ud", "ng",
    "rg", "dg", "ut", "ar", "as", "uc", "ic", "ib", "ok", "bl", "pl",
];
const FORMATS: &[(&str, &str)] = &[
    ("csv", "CSV"),
    ("pdf", "PDF"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("excel", "Excel"),
    ("xlsx", "XLSX"),
    ("xls", "XLS"),
    ("html", "HTML"),
    ("txt", "TXT"),
    ("markdown", "Markdown"),
    ("yaml", "YAML"),
    ("zip", "ZIP"),
    ("png", "PNG"),
    ("docx", "DOCX"),
];
const MAX_OBJECT_TOKENS: usize = 6;
const MAX_CONDITION_TOKENS: usize = 12;

/// Structured reading of one requirement sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Who acts ("users", "system"), determiners removed.
    pub actor: Option<String>,
    pub action: String,
    /// Direct object; may be empty for intransitive actions ("log in").
    pub object: String,
    /// Target file format ("CSV") separated from the object.
    pub format: Option<String>,
    /// Prepositional phrases in order, preposition included ("with bcrypt").
    pub modifiers: Vec<String>,
    /// Trailing clause introduced by when/if/before/... (keyword included).
    pub condition: Option<String>,
    /// True when no verb was found and `action` is a fallback.
    pub fallback: bool,
}

impl Extraction {
    /// "export audit logs", "log in".
    pub fn verb_phrase(&self) -> String {
        if self.object.is_empty() {
            self.action.clone()
        } else {
            format!("{} {}", self.action, self.object)
        }
    }

    /// Object, or the actor, or "functionality".
    pub fn object_or_actor(&self) -> String {
        if !self.object.is_empty() {
            return self.object.clone();
        }
        self.actor
            .clone()
            .filter(|a| !a.is_empty() && a != "system")
            .unwrap_or_else(|| "functionality".to_string())
    }

    /// First modifier, typically the instrument ("with email and password").
    pub fn primary_modifier(&self) -> Option<&str> {
        self.modifiers.first().map(String::as_str)
    }
}

/// Swappable sentence → [`Extraction`] strategy.
pub trait EntityExtractor {
    /// Stable identifier, part of the memo cache key.
    fn name(&self) -> &'static str;
    fn extract(&self, sentence: &str) -> Extraction;
}

/// Rule-based extractor with two profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleBasedExtractor {
    /// "allow users to export" → export.
    resolve_helpers: bool,
    /// "export logs to CSV" → object "logs", format CSV.
    separate_format: bool,
}

impl RuleBasedExtractor {
    /// Plain modal-verb reading used by the template strategy.
    pub fn basic() -> Self {
        Self {
            resolve_helpers: false,
            separate_format: false,
        }
    }

    /// Helper-verb resolution and format separation enabled.
    pub fn refined() -> Self {
        Self {
            resolve_helpers: true,
            separate_format: true,
        }
    }
}

struct Token {
    text: String,
    lower: String,
}

fn tokenize(sentence: &str) -> Vec<Token> {
    TOKEN
        .find_iter(sentence)
        .enumerate()
        .map(|(i, m)| {
            let raw = m.as_str().trim_end_matches('.');
            let text = if i == 0 { soften_initial(raw) } else { raw.to_string() };
            Token {
                lower: raw.to_lowercase(),
                text,
            }
        })
        .collect()
}

/// Undo sentence-initial capitalization ("Password" → "password") while
/// keeping acronyms and mixed-case names ("CSV", "OAuth2").
fn soften_initial(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() && chars.clone().all(|c| !c.is_uppercase()) => {
            first.to_lowercase().chain(chars).collect()
        }
        _ => word.to_string(),
    }
}

fn is_in(word: &str, list: &[&str]) -> bool {
    list.contains(&word)
}

fn format_name(word: &str) -> Option<&'static str> {
    FORMATS.iter().find(|(k, _)| *k == word).map(|(_, v)| *v)
}

/// Base form of a past participle ("encrypted" → "encrypt").
fn participle_base(word: &str) -> Option<String> {
    if let Some((_, base)) = IRREGULAR_PARTICIPLES.iter().find(|(p, _)| *p == word) {
        return Some(base.to_string());
    }
    if let Some(stem) = word.strip_suffix("ied") {
        return Some(format!("{stem}y"));
    }
    let stem = word.strip_suffix("ed")?;
    if stem.len() < 2 {
        return None;
    }
    let bytes = stem.as_bytes();
    let last = bytes[bytes.len() - 1];
    if bytes.len() >= 3 && last == bytes[bytes.len() - 2] && b"bdgmnprt".contains(&last) {
        return Some(stem[..stem.len() - 1].to_string());
    }
    if E_RESTORING_SUFFIXES.iter().any(|s| stem.ends_with(s)) {
        return Some(format!("{stem}e"));
    }
    Some(stem.to_string())
}

/// Join a verb with a following particle and map compounds to one spelling.
fn canonical_action(verb: &str, particle: Option<&str>) -> String {
    let joined = match particle {
        Some(p) => format!("{verb} {p}"),
        None => verb.to_string(),
    };
    match joined.as_str() {
        "login" | "logon" | "log on" | "signin" | "sign in" => "log in".into(),
        "logout" | "signout" | "sign out" => "log out".into(),
        "signup" => "sign up".into(),
        "setup" => "set up".into(),
        "backup" => "back up".into(),
        _ => joined,
    }
}

/// Verb base for a third-person form found without a modal ("exports").
fn bare_verb(word: &str) -> Option<&'static str> {
    COMMON_ACTIONS.iter().copied().find(|a| {
        word == *a
            || word.strip_suffix('s') == Some(a)
            || word.strip_suffix("es") == Some(a)
    })
}

impl RuleBasedExtractor {
    /// Index of the main verb and how many tokens the modal construct spans.
    fn find_modal(tokens: &[Token]) -> Option<(usize, usize)> {
        for (i, t) in tokens.iter().enumerate() {
            let next = tokens.get(i + 1).map(|t| t.lower.as_str());
            let next2 = tokens.get(i + 2).map(|t| t.lower.as_str());
            if is_in(&t.lower, SINGLE_MODALS) {
                return Some((i, i + 1));
            }
            if is_in(&t.lower, MODALS_BEFORE_TO) && next == Some("to") {
                return Some((i, i + 2));
            }
            if matches!(t.lower.as_str(), "is" | "are")
                && next.is_some_and(|n| is_in(n, COPULA_MODALS))
                && next2 == Some("to")
            {
                return Some((i, i + 3));
            }
        }
        None
    }

    fn phrase(tokens: &[Token]) -> String {
        let start = tokens
            .iter()
            .position(|t| !is_in(&t.lower, DETERMINERS))
            .unwrap_or(tokens.len());
        tokens[start..]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Skip adverbs, negation and "be able to" after a modal.
    fn skip_fillers(tokens: &[Token], mut i: usize) -> usize {
        loop {
            match tokens.get(i).map(|t| t.lower.as_str()) {
                Some(w) if is_in(w, SKIPPABLE) || (w.ends_with("ly") && w.len() > 4) => i += 1,
                Some("be")
                    if tokens.get(i + 1).is_some_and(|t| t.lower == "able")
                        && tokens.get(i + 2).is_some_and(|t| t.lower == "to") =>
                {
                    i += 3
                }
                _ => return i,
            }
        }
    }

    /// Read a verb (plus particle) at `i`; returns the action and next index.
    fn read_verb(tokens: &[Token], i: usize) -> Option<(String, usize)> {
        let verb = tokens.get(i)?;
        let particle = tokens
            .get(i + 1)
            .filter(|p| is_in(&verb.lower, PARTICLE_VERBS) && is_in(&p.lower, PARTICLES));
        let next = if particle.is_some() { i + 2 } else { i + 1 };
        Some((
            canonical_action(&verb.lower, particle.map(|p| p.lower.as_str())),
            next,
        ))
    }

    /// Collect the object phrase starting at `i` up to the first stop word.
    fn read_object(tokens: &[Token], i: usize) -> (String, usize) {
        let mut end = i;
        while end < tokens.len()
            && !is_in(&tokens[end].lower, STOP_WORDS)
            && end - i < MAX_OBJECT_TOKENS
        {
            end += 1;
        }
        (Self::phrase(&tokens[i..end]), end)
    }

    /// "allow users to export" / "provide the ability to export".
    fn resolve_helper(tokens: &[Token], action: &str, i: usize) -> Option<(Option<String>, String, usize)> {
        let window_end = (i + 6).min(tokens.len());
        let to_index = (i..window_end).find(|&j| tokens[j].lower == "to")?;
        let after = tokens.get(to_index + 1)?;
        if is_in(&after.lower, DETERMINERS) || is_in(&after.lower, STOP_WORDS) {
            return None;
        }
        let between = &tokens[i..to_index];
        if is_in(action, ABILITY_HELPERS)
            && !between.iter().any(|t| is_in(&t.lower, ABILITY_NOUNS))
        {
            return None;
        }
        let actor = if is_in(action, HELPER_VERBS) && !between.is_empty() {
            Some(Self::phrase(between)).filter(|p| !p.is_empty())
        } else {
            None
        };
        let (verb, next) = Self::read_verb(tokens, to_index + 1)?;
        Some((actor, verb, next))
    }

    /// Prepositional phrases after the object.
    fn read_tail(&self, tokens: &[Token], mut i: usize, out: &mut Extraction) {
        while i < tokens.len() {
            let word = tokens[i].lower.as_str();
            if !is_in(word, STOP_WORDS) {
                i += 1;
                continue;
            }
            if is_in(word, CONDITION_WORDS) {
                let end = (i + MAX_CONDITION_TOKENS).min(tokens.len());
                out.condition = Some(
                    tokens[i..end]
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                );
                return;
            }

            let mut end = i + 1;
            while end < tokens.len() && !is_in(&tokens[end].lower, STOP_WORDS) {
                end += 1;
            }
            let body = Self::phrase(&tokens[i + 1..end]);
            if !body.is_empty() {
                let format = matches!(word, "to" | "as" | "in" | "into")
                    .then(|| tokens[i + 1..end].iter().find_map(|t| format_name(&t.lower)))
                    .flatten();
                match format {
                    Some(f) if self.separate_format && out.format.is_none() => {
                        out.format = Some(f.to_string());
                    }
                    _ => {
                        let prep = match word {
                            "using" => "with",
                            "through" => "via",
                            other => other,
                        };
                        out.modifiers.push(format!("{prep} {body}"));
                    }
                }
            }
            i = end;
        }
    }
}

impl EntityExtractor for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        if self.resolve_helpers {
            "rule-based-refined"
        } else {
            "rule-based-basic"
        }
    }

    fn extract(&self, sentence: &str) -> Extraction {
        let tokens = tokenize(sentence);
        let mut out = Extraction::default();

        let (verb_start, actor_tokens) = match Self::find_modal(&tokens) {
            Some((modal, after)) => (Self::skip_fillers(&tokens, after), &tokens[..modal]),
            None => match tokens.iter().position(|t| bare_verb(&t.lower).is_some()) {
                Some(i) => (i, &tokens[..i]),
                None => {
                    out.action = "implement".into();
                    out.fallback = true;
                    let (object, _) = Self::read_object(&tokens, 0);
                    out.object = object;
                    return out;
                }
            },
        };
        out.actor = Some(Self::phrase(actor_tokens)).filter(|a| !a.is_empty());

        let Some(verb_token) = tokens.get(verb_start) else {
            out.action = "implement".into();
            out.fallback = true;
            return out;
        };

        // Passive or copular "be ...".
        if verb_token.lower == "be" {
            if let Some(base) = tokens
                .get(verb_start + 1)
                .and_then(|t| participle_base(&t.lower))
            {
                let particle = tokens
                    .get(verb_start + 2)
                    .filter(|p| is_in(&base, PARTICLE_VERBS) && is_in(&p.lower, PARTICLES));
                out.action = canonical_action(&base, particle.map(|p| p.lower.as_str()));
                out.object = out.actor.clone().unwrap_or_default();
                let next = verb_start + if particle.is_some() { 3 } else { 2 };
                self.read_tail(&tokens, next, &mut out);
                return out;
            }
            let (state, next) = Self::read_object(&tokens, verb_start + 1);
            out.action = "ensure".into();
            out.object = match &out.actor {
                Some(actor) if !state.is_empty() => format!("{actor} is {state}"),
                _ => state,
            };
            self.read_tail(&tokens, next, &mut out);
            return out;
        }

        let verb_lower = bare_verb(&verb_token.lower)
            .map(str::to_string)
            .unwrap_or_else(|| verb_token.lower.clone());
        let Some((mut action, mut next)) = Self::read_verb(&tokens, verb_start) else {
            return out;
        };
        if action == verb_token.lower {
            action = canonical_action(&verb_lower, None);
        }

        if self.resolve_helpers
            && (is_in(&action, HELPER_VERBS) || is_in(&action, ABILITY_HELPERS))
        {
            if let Some((actor, resolved, after)) = Self::resolve_helper(&tokens, &action, next) {
                if actor.is_some() {
                    out.actor = actor;
                }
                action = resolved;
                next = after;
            }
        }

        let (object, after_object) = Self::read_object(&tokens, next);
        out.action = action;
        out.object = object;
        self.read_tail(&tokens, after_object, &mut out);
        out
    }
}

/// Document-scoped memo of extraction results keyed by the SHA-256 of the
/// extractor name and sentence text.
#[derive(Debug, Default)]
pub struct ExtractionCache {
    entries: HashMap<[u8; 32], Extraction>,
    hits: usize,
}

impl ExtractionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_extract(&mut self, extractor: &dyn EntityExtractor, text: &str) -> Extraction {
        let mut hasher = Sha256::new();
        hasher.update(extractor.name().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.trim().as_bytes());
        let key: [u8; 32] = hasher.finalize().into();

        if let Some(found) = self.entries.get(&key) {
            self.hits += 1;
            return found.clone();
        }
        let extraction = extractor.extract(text);
        self.entries.insert(key, extraction.clone());
        extraction
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
