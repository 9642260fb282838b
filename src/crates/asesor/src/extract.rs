//! Structured-field extraction from free text
//!
//! The [`Extractor`] collaborator pulls business facts out of a user
//! message and merges them into the current profile. The contract is a pure
//! merge: given identical input text and profile, the result is identical,
//! and a field that is already known is never un-set or overwritten.
//!
//! [`KeywordExtractor`] is the built-in implementation: cue-phrase regexes
//! for the business name and location, a sector keyword table, and a
//! focus-driven fallback that attributes otherwise unmatched text to the
//! first field the gathering flow is currently asking about. An LLM-backed
//! extractor can be substituted behind the same trait without touching any
//! node.

use regex::Regex;
use tracing::debug;

use crate::profile::BusinessProfile;

/// Pure extraction collaborator
pub trait Extractor: Send + Sync {
    /// Extract fields from `user_text` and merge them over `current`
    fn extract(&self, user_text: &str, current: &BusinessProfile) -> BusinessProfile;
}

/// Sector keyword table: a mention anywhere in the message fills `sector`
const SECTOR_KEYWORDS: [(&str, &str); 12] = [
    ("panader", "Panadería"),
    ("restaurant", "Restaurantes"),
    ("cafeter", "Cafeterías"),
    ("bodega", "Retail (bodega)"),
    ("ferreter", "Ferretería"),
    ("farmacia", "Farmacias"),
    ("software", "Software (SaaS)"),
    ("consultor", "Consultoría"),
    ("textil", "Textil"),
    ("transporte", "Transporte"),
    ("agricol", "Agricultura"),
    ("tienda", "Retail"),
];

/// Regex and keyword based extractor
pub struct KeywordExtractor {
    name_cue: Regex,
    location_cue: Regex,
    years_cue: Regex,
    employees_cue: Regex,
}

impl KeywordExtractor {
    /// Build the extractor with its compiled patterns
    pub fn new() -> Self {
        Self {
            // "mi empresa se llama X", "nos llamamos X"; the capture stops
            // at punctuation or a following clause ("... y vendemos pan")
            name_cue: Regex::new(
                r"(?i)(?:se llama|nos llamamos|mi (?:empresa|negocio) es)\s+([\pL\pN][\pL\pN' &-]*?)(?:\s+y\s|[,.\n]|$)",
            )
            .expect("static regex"),
            // "en Lima", "en Buenos Aires" (capitalized place after "en")
            location_cue: Regex::new(r"\ben\s+([A-ZÁÉÍÓÚÑ][\pL]+(?:\s+[A-ZÁÉÍÓÚÑ][\pL]+)*)")
                .expect("static regex"),
            years_cue: Regex::new(r"(?i)(\d{1,3})\s+años").expect("static regex"),
            employees_cue: Regex::new(r"(?i)(\d{1,5})\s+(?:empleados|trabajadores|personas)")
                .expect("static regex"),
        }
    }

    fn extract_name(&self, text: &str) -> Option<String> {
        let captured = self.name_cue.captures(text)?.get(1)?.as_str();
        let name = captured.trim().trim_end_matches(['.', ',']);
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn extract_location(&self, text: &str) -> Option<String> {
        let captured = self.location_cue.captures(text)?.get(1)?.as_str().trim();
        if captured.is_empty() {
            None
        } else {
            Some(captured.to_string())
        }
    }

    fn extract_sector(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        SECTOR_KEYWORDS
            .into_iter()
            .find(|(cue, _)| lowered.contains(cue))
            .map(|(_, sector)| sector.to_string())
    }

    /// Split a free-text enumeration into list items
    fn split_list(text: &str) -> Vec<String> {
        text.replace('\n', ",")
            .split([',', ';'])
            .map(|item| item.trim().trim_start_matches("y ").trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for KeywordExtractor {
    fn extract(&self, user_text: &str, current: &BusinessProfile) -> BusinessProfile {
        let mut updated = current.clone();
        let text = user_text.trim();
        if text.is_empty() {
            return updated;
        }

        // Opportunistic cues, applied wherever they appear in the message.
        if updated.nombre_empresa.is_none() {
            updated.nombre_empresa = self.extract_name(text);
        }
        if updated.ubicacion.is_none() {
            updated.ubicacion = self.extract_location(text);
        }
        if updated.sector.is_none() {
            updated.sector = self.extract_sector(text);
        }
        if updated.anos_operacion.is_none() {
            updated.anos_operacion = self
                .years_cue
                .captures(text)
                .and_then(|c| c.get(1)?.as_str().parse().ok());
        }
        if updated.num_empleados.is_none() {
            updated.num_empleados = self
                .employees_cue
                .captures(text)
                .and_then(|c| c.get(1)?.as_str().parse().ok());
        }

        // Focus fallback: attribute the message to the field currently
        // being gathered, when no cue already claimed it.
        if let Some((focus, _)) = current.next_question() {
            match focus {
                "descripcion_negocio" if updated.descripcion_negocio.is_none() => {
                    updated.descripcion_negocio = Some(text.to_string());
                }
                "productos_servicios_principales"
                    if updated.productos_servicios_principales.is_empty() =>
                {
                    updated.productos_servicios_principales = Self::split_list(text);
                }
                "desafios_principales" if updated.desafios_principales.is_empty() => {
                    updated.desafios_principales = Self::split_list(text);
                }
                "sector" if updated.sector.is_none() => {
                    updated.sector = Some(text.to_string());
                }
                _ => {}
            }
        }

        if updated != *current {
            debug!(missing = ?updated.missing_critical(), "extracted new business fields");
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bakery_in_lima() {
        let extractor = KeywordExtractor::new();
        let profile = extractor.extract("Tengo una panadería en Lima", &BusinessProfile::default());

        assert_eq!(profile.sector.as_deref(), Some("Panadería"));
        assert_eq!(profile.ubicacion.as_deref(), Some("Lima"));
    }

    #[test]
    fn test_name_cue() {
        let extractor = KeywordExtractor::new();
        let profile = extractor.extract(
            "Mi empresa se llama Panes del Sur y vendemos pan artesanal",
            &BusinessProfile::default(),
        );
        assert_eq!(profile.nombre_empresa.as_deref(), Some("Panes del Sur"));
    }

    #[test]
    fn test_years_and_employees() {
        let extractor = KeywordExtractor::new();
        let profile = extractor.extract(
            "Operamos hace 12 años con 8 empleados",
            &BusinessProfile::default(),
        );
        assert_eq!(profile.anos_operacion, Some(12));
        assert_eq!(profile.num_empleados, Some(8));
    }

    #[test]
    fn test_focus_fallback_fills_description() {
        let extractor = KeywordExtractor::new();
        let current = BusinessProfile {
            nombre_empresa: Some("Panes SAC".into()),
            ..Default::default()
        };
        // Next question focus is descripcion_negocio; free text lands there.
        let profile = extractor.extract("vendemos pan artesanal al por mayor", &current);
        assert_eq!(
            profile.descripcion_negocio.as_deref(),
            Some("vendemos pan artesanal al por mayor")
        );
    }

    #[test]
    fn test_list_fields_split_on_commas() {
        let extractor = KeywordExtractor::new();
        let current = BusinessProfile {
            nombre_empresa: Some("Panes SAC".into()),
            descripcion_negocio: Some("panadería artesanal".into()),
            ..Default::default()
        };
        let profile = extractor.extract("pan, tortas y postres, catering", &current);
        assert_eq!(
            profile.productos_servicios_principales,
            vec!["pan", "tortas y postres", "catering"]
        );
    }

    #[test]
    fn test_known_fields_are_never_overwritten() {
        let extractor = KeywordExtractor::new();
        let current = BusinessProfile {
            ubicacion: Some("Arequipa".into()),
            sector: Some("Textil".into()),
            ..Default::default()
        };
        let profile = extractor.extract("ahora también en Lima, una panadería", &current);
        assert_eq!(profile.ubicacion.as_deref(), Some("Arequipa"));
        assert_eq!(profile.sector.as_deref(), Some("Textil"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = KeywordExtractor::new();
        let current = BusinessProfile::default();
        let a = extractor.extract("Tengo una panadería en Lima", &current);
        let b = extractor.extract("Tengo una panadería en Lima", &current);
        assert_eq!(a, b);
    }
}
