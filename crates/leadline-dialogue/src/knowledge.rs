//! Static knowledge table and the topic matcher.
//!
//! The table is loaded once at process start and shared read-only by every
//! session. Per-call rotation state lives in [`TopicHits`].

use crate::error::KnowledgeError;
use crate::lexicon::Lexicon;
use crate::step::Step;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One informational topic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    pub id: String,
    /// Lowercase substrings; any one of them selects the topic.
    pub patterns: Vec<String>,
    /// Rotated through on repeated questions.
    pub answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(rename = "topic", default)]
    topics: Vec<Topic>,
}

/// Ordered, immutable topic table.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    topics: Vec<Topic>,
}

fn topic(id: &str, patterns: &[&str], answers: &[&str]) -> Topic {
    Topic {
        id: id.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        answers: answers.iter().map(|a| a.to_string()).collect(),
    }
}

impl KnowledgeBase {
    /// Builds a table, rejecting topics without patterns or answers.
    pub fn new(topics: Vec<Topic>) -> Result<Self, KnowledgeError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(topics.len());
        for mut topic in topics {
            if !seen.insert(topic.id.clone()) {
                return Err(KnowledgeError::DuplicateTopic(topic.id));
            }
            topic.patterns = topic
                .patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
            if topic.patterns.is_empty() {
                return Err(KnowledgeError::NoPatterns(topic.id));
            }
            if topic.answers.is_empty() {
                return Err(KnowledgeError::NoAnswers(topic.id));
            }
            normalized.push(topic);
        }
        Ok(Self { topics: normalized })
    }

    /// The built-in Spanish table.
    pub fn builtin() -> Self {
        Self {
            topics: vec![
                topic(
                    "que_hace",
                    &["que hac", "qué hac", "quienes sois", "quiénes sois", "qué es spainroom", "que es spainroom"],
                    &[
                        "SpainRoom alquila habitaciones de medio y largo plazo. No somos hotel.",
                        "Intermediamos, validamos documentación y firmamos digitalmente para su seguridad.",
                    ],
                ),
                topic(
                    "minimo_precios",
                    &["minimo", "mínimo", "precio", "tarifa"],
                    &[
                        "La estancia mínima es de un mes. El precio depende de la habitación y la zona.",
                        "Le ayudamos a comparar opciones disponibles en su ciudad.",
                    ],
                ),
                topic(
                    "documentos",
                    &["document", "dni", "pasaporte", "requisitos"],
                    &[
                        "Para inquilinos: DNI o pasaporte y comprobante del teléfono declarado.",
                        "La firma es electrónica y guardamos justificantes para su tranquilidad.",
                    ],
                ),
                topic(
                    "proceso",
                    &["proceso", "como func", "cómo func", "pasos"],
                    &[
                        "El proceso es simple: solicitud, verificación, contrato digital y entrada.",
                        "Le guiamos en cada paso y resolvemos dudas en el momento.",
                    ],
                ),
                topic(
                    "pagos",
                    &["pago", "stripe", "cobro", "tarjeta"],
                    &[
                        "Los pagos son seguros con Stripe. La plataforma cobra y gestiona las transferencias.",
                        "Propietarios y franquiciados reciben sus pagos según la política acordada.",
                    ],
                ),
                topic(
                    "propietarios",
                    &["propietar", "duen", "dueñ", "propiedad"],
                    &[
                        "Para propietarios: publicamos, filtramos inquilinos, hacemos contrato y cobramos.",
                        "Requisitos básicos: cerradura, cama de 135 por 200 y buen estado.",
                    ],
                ),
                topic(
                    "soporte",
                    &["soporte", "telefono", "teléfono", "horario"],
                    &[
                        "Tiene soporte durante la estancia por chat y teléfono.",
                        "Si quiere, tomamos sus datos y le llama un asesor.",
                    ],
                ),
                topic(
                    "contrato",
                    &["contrato", "logalty", "firma"],
                    &[
                        "Los contratos se firman digitalmente con plena validez legal.",
                        "Guardamos los justificantes para auditoría y tranquilidad de ambas partes.",
                    ],
                ),
            ],
        }
    }

    /// Parses a TOML table of `[[topic]]` entries.
    pub fn from_toml_str(contents: &str) -> Result<Self, KnowledgeError> {
        let file: KnowledgeFile = toml::from_str(contents)?;
        Self::new(file.topics)
    }

    /// Loads a TOML topic table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// First topic, in table order, with a pattern contained in `lowered`.
    ///
    /// While capturing slots, text that answers the role question never
    /// selects a topic.
    pub fn match_topic(&self, lexicon: &Lexicon, step: Step, lowered: &str) -> Option<&Topic> {
        if step.is_capture() && lexicon.is_role_keyword(lowered) {
            return None;
        }
        self.topics
            .iter()
            .find(|t| t.patterns.iter().any(|p| lowered.contains(p.as_str())))
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Per-call count of answers given per topic.
#[derive(Debug, Clone, Default)]
pub struct TopicHits {
    hits: HashMap<String, usize>,
}

impl TopicHits {
    /// Picks the next answer for `topic` and advances its counter.
    pub fn next_answer<'a>(&mut self, topic: &'a Topic) -> &'a str {
        let count = self.hits.entry(topic.id.clone()).or_insert(0);
        let answer = &topic.answers[*count % topic.answers.len()];
        *count += 1;
        answer
    }

    pub fn count(&self, topic_id: &str) -> usize {
        self.hits.get(topic_id).copied().unwrap_or(0)
    }
}
