//! Structured business profile
//!
//! [`BusinessProfile`] is the typed view over the open `context` map of the
//! state record. The engine only sees loose key-value pairs; this module
//! gives the assistant's nodes a schema to read and write them through.
//!
//! Four fields are critical: without them the assistant cannot do useful
//! research, so the routing policy keeps sending the conversation back to
//! the gathering agent until they are filled. The rest enrich the analysis
//! but never block it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Context keys that must be known before research can start
pub const CRITICAL_FIELDS: [&str; 4] = [
    "nombre_empresa",
    "ubicacion",
    "productos_servicios_principales",
    "descripcion_negocio",
];

/// Required fields in gathering order, with the conversational focus of the
/// question that fills each one
const FIELD_QUESTIONS: [(&str, &str); 6] = [
    ("nombre_empresa", "el nombre de la empresa"),
    ("descripcion_negocio", "una descripción general del negocio"),
    ("productos_servicios_principales", "los productos o servicios principales"),
    ("ubicacion", "la ubicación donde opera"),
    ("sector", "el sector o industria específica"),
    ("desafios_principales", "los principales desafíos del negocio"),
];

/// Factual and descriptive information about the user's business
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BusinessProfile {
    /// Official or commercial business name
    pub nombre_empresa: Option<String>,

    /// Industry, e.g. "Restaurantes", "Software (SaaS)"
    pub sector: Option<String>,

    /// Where the business operates, e.g. "Lima, Perú", "Online"
    pub ubicacion: Option<String>,

    /// Short description of what the business does
    pub descripcion_negocio: Option<String>,

    /// Main products or services offered
    #[serde(default)]
    pub productos_servicios_principales: Vec<String>,

    /// Main obstacles the business faces
    #[serde(default)]
    pub desafios_principales: Vec<String>,

    /// Years in operation
    pub anos_operacion: Option<u32>,

    /// Headcount
    pub num_empleados: Option<u32>,
}

impl BusinessProfile {
    /// Read the profile out of a state record's context map
    pub fn from_context(context: &Map<String, Value>) -> Self {
        let string = |key: &str| {
            context
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let list = |key: &str| {
            context
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        let number = |key: &str| {
            context
                .get(key)
                .and_then(Value::as_u64)
                .map(|n| n as u32)
        };

        Self {
            nombre_empresa: string("nombre_empresa"),
            sector: string("sector"),
            ubicacion: string("ubicacion"),
            descripcion_negocio: string("descripcion_negocio"),
            productos_servicios_principales: list("productos_servicios_principales"),
            desafios_principales: list("desafios_principales"),
            anos_operacion: number("anos_operacion"),
            num_empleados: number("num_empleados"),
        }
    }

    /// Write the known fields back into a context map
    pub fn to_context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        if let Some(v) = &self.nombre_empresa {
            context.insert("nombre_empresa".into(), json!(v));
        }
        if let Some(v) = &self.sector {
            context.insert("sector".into(), json!(v));
        }
        if let Some(v) = &self.ubicacion {
            context.insert("ubicacion".into(), json!(v));
        }
        if let Some(v) = &self.descripcion_negocio {
            context.insert("descripcion_negocio".into(), json!(v));
        }
        if !self.productos_servicios_principales.is_empty() {
            context.insert(
                "productos_servicios_principales".into(),
                json!(self.productos_servicios_principales),
            );
        }
        if !self.desafios_principales.is_empty() {
            context.insert("desafios_principales".into(), json!(self.desafios_principales));
        }
        if let Some(v) = self.anos_operacion {
            context.insert("anos_operacion".into(), json!(v));
        }
        if let Some(v) = self.num_empleados {
            context.insert("num_empleados".into(), json!(v));
        }
        context
    }

    fn has_field(&self, key: &str) -> bool {
        match key {
            "nombre_empresa" => self.nombre_empresa.is_some(),
            "sector" => self.sector.is_some(),
            "ubicacion" => self.ubicacion.is_some(),
            "descripcion_negocio" => self.descripcion_negocio.is_some(),
            "productos_servicios_principales" => !self.productos_servicios_principales.is_empty(),
            "desafios_principales" => !self.desafios_principales.is_empty(),
            "anos_operacion" => self.anos_operacion.is_some(),
            "num_empleados" => self.num_empleados.is_some(),
            _ => false,
        }
    }

    /// Critical fields still unknown
    pub fn missing_critical(&self) -> Vec<&'static str> {
        CRITICAL_FIELDS
            .into_iter()
            .filter(|field| !self.has_field(field))
            .collect()
    }

    /// True once every critical field is known
    pub fn can_research(&self) -> bool {
        self.missing_critical().is_empty()
    }

    /// Fraction of all profile fields that are known, 0.0 to 1.0
    pub fn completeness(&self) -> f64 {
        let all = [
            "nombre_empresa",
            "sector",
            "ubicacion",
            "descripcion_negocio",
            "productos_servicios_principales",
            "desafios_principales",
            "anos_operacion",
            "num_empleados",
        ];
        let known = all.iter().filter(|field| self.has_field(field)).count();
        known as f64 / all.len() as f64
    }

    /// Next field to ask about, with its conversational focus
    ///
    /// Follows the gathering order: identity first, then what the business
    /// does, then where, then the optional enrichment fields.
    pub fn next_question(&self) -> Option<(&'static str, &'static str)> {
        FIELD_QUESTIONS
            .into_iter()
            .find(|(field, _)| !self.has_field(field))
    }

    /// Fill unknown fields from another profile, never un-setting a known one
    pub fn merge(&mut self, newer: &BusinessProfile) {
        if self.nombre_empresa.is_none() {
            self.nombre_empresa = newer.nombre_empresa.clone();
        }
        if self.sector.is_none() {
            self.sector = newer.sector.clone();
        }
        if self.ubicacion.is_none() {
            self.ubicacion = newer.ubicacion.clone();
        }
        if self.descripcion_negocio.is_none() {
            self.descripcion_negocio = newer.descripcion_negocio.clone();
        }
        for item in &newer.productos_servicios_principales {
            if !self.productos_servicios_principales.contains(item) {
                self.productos_servicios_principales.push(item.clone());
            }
        }
        for item in &newer.desafios_principales {
            if !self.desafios_principales.contains(item) {
                self.desafios_principales.push(item.clone());
            }
        }
        if self.anos_operacion.is_none() {
            self.anos_operacion = newer.anos_operacion;
        }
        if self.num_empleados.is_none() {
            self.num_empleados = newer.num_empleados;
        }
    }
}
