//! Closed classification taxonomies
//!
//! A taxonomy is data, not a type: a versioned list of allowed values per
//! classification dimension, loaded once at startup and shared immutably.
//! Two built-in versions ship with the crate, one per extraction variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal meaning "field not determinable from the text"
pub const SENTINEL: &str = "No especificado";

/// Whether a value is exactly the sentinel
pub fn is_sentinel(value: &str) -> bool {
    value == SENTINEL
}

/// Classification dimensions that may carry a closed list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Kind of initiative or norm
    TipoIniciativa,
    /// Economic sector
    Sector,
    /// Geographic scope
    MarcoGeografico,
    /// Publishing institution
    Fuente,
    /// Proposing body (closed only in the normative-updates variant)
    Proponente,
}

impl Dimension {
    /// All dimensions in record field order
    pub const ALL: [Dimension; 5] = [
        Dimension::TipoIniciativa,
        Dimension::Sector,
        Dimension::MarcoGeografico,
        Dimension::Fuente,
        Dimension::Proponente,
    ];

    /// Record field name for this dimension
    pub fn field_name(&self) -> &'static str {
        match self {
            Dimension::TipoIniciativa => "tipo_iniciativa",
            Dimension::Sector => "sector",
            Dimension::MarcoGeografico => "marco_geografico",
            Dimension::Fuente => "fuente",
            Dimension::Proponente => "proponente",
        }
    }

    /// Tag used when rendering the closed list into a prompt
    pub fn tag(&self) -> String {
        self.field_name().to_uppercase()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Which kind of records a taxonomy set is meant to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionVariant {
    /// Legislative initiatives from parliamentary bulletins
    LegislativeInitiatives,
    /// Normative updates from official gazettes
    NormativeUpdates,
}

impl ExtractionVariant {
    /// Label sent as request metadata to the reasoning service
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionVariant::LegislativeInitiatives => "legal_initiatives",
            ExtractionVariant::NormativeUpdates => "normative_updates",
        }
    }

    /// Whether records of this variant carry a `subgrupo` field
    pub fn has_subgroup(&self) -> bool {
        matches!(self, ExtractionVariant::NormativeUpdates)
    }
}

/// Closed list of allowed values for one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Dimension this list constrains
    pub dimension: Dimension,

    /// Allowed values, in prompt rendering order
    pub values: Vec<String>,
}

impl Taxonomy {
    /// Create a taxonomy from a list of values
    pub fn new<I, S>(dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact membership test
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Membership test that also accepts the sentinel
    pub fn admits(&self, value: &str) -> bool {
        is_sentinel(value) || self.contains(value)
    }
}

/// A versioned set of taxonomies for one extraction variant
///
/// # Examples
///
/// ```
/// use papyrus_domain::{Dimension, TaxonomySet, SENTINEL};
///
/// let taxonomies = TaxonomySet::legislative();
/// assert!(taxonomies.admits(Dimension::Fuente, "Congreso"));
/// assert!(taxonomies.admits(Dimension::Fuente, SENTINEL));
/// assert!(!taxonomies.admits(Dimension::Fuente, "Ayuntamiento"));
///
/// // proponente is free text for legislative initiatives
/// assert!(!taxonomies.is_closed(Dimension::Proponente));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySet {
    /// Version string, recorded in extraction metadata
    pub version: String,

    /// Variant these lists belong to
    pub variant: ExtractionVariant,

    /// Closed lists, in prompt rendering order
    pub taxonomies: Vec<Taxonomy>,
}

impl TaxonomySet {
    /// Built-in taxonomy for legislative initiatives
    pub fn legislative() -> Self {
        Self {
            version: "legislative-2025.1".to_string(),
            variant: ExtractionVariant::LegislativeInitiatives,
            taxonomies: vec![
                Taxonomy::new(Dimension::Sector, SECTORS.iter().copied()),
                Taxonomy::new(Dimension::MarcoGeografico, GEOGRAPHIC_SCOPES.iter().copied()),
                Taxonomy::new(Dimension::Fuente, SOURCES.iter().copied()),
                Taxonomy::new(Dimension::TipoIniciativa, LEGISLATIVE_TYPES.iter().copied()),
            ],
        }
    }

    /// Built-in taxonomy for normative updates
    pub fn normative() -> Self {
        Self {
            version: "normative-2025.1".to_string(),
            variant: ExtractionVariant::NormativeUpdates,
            taxonomies: vec![
                Taxonomy::new(Dimension::Sector, SECTORS.iter().copied()),
                Taxonomy::new(Dimension::MarcoGeografico, GEOGRAPHIC_SCOPES.iter().copied()),
                Taxonomy::new(Dimension::Fuente, SOURCES.iter().copied()),
                Taxonomy::new(Dimension::Proponente, NORMATIVE_PROPONENTS.iter().copied()),
                Taxonomy::new(Dimension::TipoIniciativa, NORMATIVE_TYPES.iter().copied()),
            ],
        }
    }

    /// Built-in taxonomy for a variant
    pub fn for_variant(variant: ExtractionVariant) -> Self {
        match variant {
            ExtractionVariant::LegislativeInitiatives => Self::legislative(),
            ExtractionVariant::NormativeUpdates => Self::normative(),
        }
    }

    /// Closed list for a dimension, if that dimension is closed in this set
    pub fn get(&self, dimension: Dimension) -> Option<&Taxonomy> {
        self.taxonomies.iter().find(|t| t.dimension == dimension)
    }

    /// Whether a dimension is constrained by a closed list
    pub fn is_closed(&self, dimension: Dimension) -> bool {
        self.get(dimension).is_some()
    }

    /// Dimensions constrained by a closed list, in rendering order
    pub fn closed_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.taxonomies.iter().map(|t| t.dimension)
    }

    /// Whether `value` is acceptable for `dimension`
    ///
    /// Free-text dimensions accept anything.
    pub fn admits(&self, dimension: Dimension, value: &str) -> bool {
        match self.get(dimension) {
            Some(taxonomy) => taxonomy.admits(value),
            None => true,
        }
    }

    /// Check structural soundness of a (possibly user-supplied) set
    pub fn validate(&self) -> Result<(), String> {
        if self.version.trim().is_empty() {
            return Err("taxonomy version must not be empty".to_string());
        }
        for (idx, taxonomy) in self.taxonomies.iter().enumerate() {
            if taxonomy.values.is_empty() {
                return Err(format!("taxonomy '{}' has no values", taxonomy.dimension));
            }
            if self.taxonomies[..idx]
                .iter()
                .any(|t| t.dimension == taxonomy.dimension)
            {
                return Err(format!("taxonomy '{}' is defined twice", taxonomy.dimension));
            }
            if taxonomy.values.iter().any(|v| is_sentinel(v)) {
                return Err(format!(
                    "taxonomy '{}' must not list the sentinel as a value",
                    taxonomy.dimension
                ));
            }
        }
        for required in [Dimension::TipoIniciativa, Dimension::Sector, Dimension::MarcoGeografico, Dimension::Fuente] {
            if !self.is_closed(required) {
                return Err(format!("taxonomy '{}' is required", required));
            }
        }
        if self.variant == ExtractionVariant::NormativeUpdates && !self.is_closed(Dimension::Proponente) {
            return Err("normative updates require a closed 'proponente' list".to_string());
        }
        Ok(())
    }
}

const SECTORS: &[&str] = &[
    "Alimentación",
    "Economía Circular",
    "Sequía",
    "Salud",
    "Primario",
    "Pesca",
    "Medioambiente",
    "Minería",
    "Energía",
    "Movilidad",
    "Financiero y seguros",
    "Juego",
    "Otros",
    "Empresa",
    "Defensa",
    "Digitalización",
    "Comercio",
    "Innovación",
    "Turismo",
    "Vivienda",
    "Industria",
    "Infraestructuras",
    "Consumo",
    "Farmacéutico",
    "Telecomunicaciones",
    "Unión Europea",
    "Institucional",
    "Cultura",
    "Fondos UE",
    "Ganadería",
    // Kept as published in 2025.1; records persisted under this version carry it.
    "Digitaliazación",
    "Fitosanitarios",
    "Educación",
    "Financiero",
    "Videojuegos",
    "Tabaco",
    "Ferroviario",
    "Audiovisual",
    "Empleo",
    "Presupuestos",
    "Aluminio",
    "General",
    "Cáncer",
    "Adicciones",
    "IA",
];

const GEOGRAPHIC_SCOPES: &[&str] = &[
    "Autonómico",
    "Nacional",
    "Municipal",
    "Provincial",
    "Europeo",
    "Internacional",
];

const SOURCES: &[&str] = &[
    "Congreso",
    "Senado",
    "Parlamento Europeo",
    "Parlamento Autonómico",
    "Consejo de Ministros",
    "Comisión Europea",
];

const LEGISLATIVE_TYPES: &[&str] = &[
    "Proyecto de ley",
    "Proposición de ley",
    "Iniciativa legislativa popular",
    "Reforma del reglamento de la camara",
    "Decreto-ley",
    "Decreto Foral",
    "Ley",
    "Enmienda",
    "Dictamen",
    "Informe",
    "Debate",
    "Consulta pública",
    "Proposición no de ley",
    "Interpelación",
    "Moción",
    "Comparacencia",
    "Pregunta escrita",
    "Pregunta oral",
    "Respuesta del gobierno",
    "Solicitud/Petición de información",
    "Control de cumplimiento",
    "Organización de comisiones y nombramientos",
    "Comision de investigación",
    "Solicitud de creación",
    "Iniciativa parlamentaria europea",
    "Plan estratégico",
    "Convenio",
    "Acuerdo",
    "Complemento de resolución o moción",
    "Declaración institucional",
    "Pronuncionamiento de la Comisión",
];

const NORMATIVE_TYPES: &[&str] = &[
    "Orden",
    "Resolución",
    "Información Pública",
    "Decreto",
    "Instrucción",
    "Convocatoria",
    "Clasificación",
    "Ley",
    "Acuerdo",
    "Disposición General",
    "Recurso",
    "Otras disposiciones",
    "Subvenciones",
    "Declaración",
    "Edicto",
    "Anuncio",
    "Información",
    "Otros",
    "Extracto",
    "Reglamento",
    "Decreto-Ley",
    "Directiva",
];

const NORMATIVE_PROPONENTS: &[&str] = &[
    "Gobierno de España",
    "Unión Europea",
    "Gobierno de Andalucía",
    "Gobierno de Aragón",
    "Gobierno de Asturias",
    "Gobierno de Islas Baleares",
    "Gobierno de Canarias",
    "Gobierno de Cantabria",
    "Gobierno de Castilla-La Mancha",
    "Gobierno de Castilla y León",
    "Gobierno de Cataluña",
    "Gobierno de Extremadura",
    "Gobierno de Galicia",
    "Gobierno de La Rioja",
    "Gobierno de la Comunidad de Madrid",
    "Gobierno de Murcia",
    "Gobierno de Navarra",
    "Gobierno del País Vasco",
    "Gobierno de la Comunitat Valenciana",
    "Gobierno de Melilla",
    "Boletín Oficial de Galicia",
    "Otros",
];
