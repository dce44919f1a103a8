//! Instruction rendering for record extraction
//!
//! The instruction text is a pure function of the taxonomy set: closed lists,
//! field instructions, free-text examples, response schema and one worked
//! response, always in that order. The document body travels separately in
//! the user message, so the instruction text and its hash are computed once.

use papyrus_domain::{Dimension, ExtractionVariant, TaxonomySet, SENTINEL};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::sync::Arc;

/// A rendered request: instruction text, framed document and fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System instruction
    pub system: String,

    /// User message wrapping the document body
    pub user: String,

    /// Hex SHA-256 of `system`
    pub hash: String,
}

/// Builds extraction prompts for one taxonomy set
pub struct PromptBuilder {
    taxonomies: Arc<TaxonomySet>,
    instructions: String,
    hash: String,
}

impl PromptBuilder {
    /// Render the instruction text for a taxonomy set
    pub fn new(taxonomies: Arc<TaxonomySet>) -> Self {
        let instructions = render(&taxonomies);
        let hash = hex::encode(Sha256::digest(instructions.as_bytes()));
        Self {
            taxonomies,
            instructions,
            hash,
        }
    }

    /// Taxonomy set the instructions were rendered from
    pub fn taxonomies(&self) -> &TaxonomySet {
        &self.taxonomies
    }

    /// Instruction text
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Hex SHA-256 of the instruction text
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Build the prompt for a document body
    pub fn build(&self, body: &str) -> Prompt {
        Prompt {
            system: self.instructions.clone(),
            user: document_message(body),
            hash: self.hash.clone(),
        }
    }
}

/// Frame a document body as the user message
pub fn document_message(body: &str) -> String {
    format!("<DOCUMENTO>{}</DOCUMENTO>", body)
}

/// Variant-specific wording
struct Wording {
    intro: &'static str,
    identify: &'static str,
    per_item: &'static str,
    id: &'static str,
    tipo: &'static str,
    titulo: &'static str,
    fuente: &'static str,
    fecha: &'static str,
    more: &'static str,
    example: &'static str,
}

const LEGISLATIVE: Wording = Wording {
    intro: "Analiza el siguiente documento legal y extrae TODAS las iniciativas legislativas mencionadas.",
    identify: "Identifica TODAS las iniciativas legislativas mencionadas en el documento",
    per_item: "Para cada iniciativa, extrae la siguiente información:",
    id: "identificador único de la iniciativa (formato depende de la fuente)",
    tipo: "Clasificar según la lista cerrada proporcionada",
    titulo: "Título o descripción breve de la iniciativa",
    fuente: "Origen de la iniciativa según la lista cerrada",
    fecha: "Fecha de la iniciativa (formato YYYY-MM-DD) si está disponible",
    more: "// ... más iniciativas si existen",
    example: LEGISLATIVE_EXAMPLE,
};

const NORMATIVE: Wording = Wording {
    intro: "Analiza el siguiente contenido de boletines oficiales y extrae TODAS las novedades normativas publicadas en España.",
    identify: "Identifica TODAS las novedades normativas publicadas en el texto",
    per_item: "Para cada novedad normativa, extrae la siguiente información:",
    id: "identificador único o referencia oficial (formato depende de la fuente)",
    tipo: "Clasificar según la lista cerrada proporcionada (tipo de norma)",
    titulo: "Título o descripción breve de la norma",
    fuente: "Origen de la publicación según la lista cerrada",
    fecha: "Fecha de publicación (formato YYYY-MM-DD) si está disponible",
    more: "// ... más normas si existen",
    example: NORMATIVE_EXAMPLE,
};

const SUBSECTOR_EXAMPLES: &[&str] = &[
    "Salud - Cáncer",
    "Primario - Cárnico",
    "Primario - Agricultura",
    "Minería - Silicosis",
    "Energía - Eficiencia Energética",
    "Economía Circular - Residuos",
    "Movilidad - VTC",
    "Movilidad - Taxi",
    "Salud - Dental",
    "Energía - Renovables",
    "Energía - Gas",
    "Medioambiente - Emisiones",
];

const TOPIC_EXAMPLES: &[&str] = &[
    "Doñana",
    "Sostenibilidad",
    "PIB",
    "Ganadería",
    "Ecoturismo",
    "Agua",
    "Digitalización",
    "Biodiversidad",
    "Cáncer",
    "Energía - Renovables - Eólica",
    "Industria - Automotriz",
    "Vivienda",
    "IA",
    "Tabaco",
    "Combustible",
    "Vehículos",
];

const PROPONENT_EXAMPLES: &[&str] = &[
    "Grupo Popular",
    "Grupo Socialista",
    "Pleno",
    "Comisión de Agricultura, Pesca y Alimentación",
    "Gobierno de Andalucía",
    "Grupo VOX",
    "Grupo Candidatura d'Unitat Popular",
    "Grupo Junts per Catalunya",
    "Grupo Socialistes i Units per avançar",
    "Grupo En Comú Podem",
    "Grupo Ciudadanos",
    "No adscritos",
    "Grupo BNG",
];

const SUBGROUP_EXAMPLES: &[&str] = &[
    "Consejería de Justicia, Administración Local y Función Pública",
    "Consejería de Medio Rural y Cohesión territorial",
    "Consejo de Gobierno",
    "Consejo Insular de Mallorca",
    "Cámara de Comercio de Cantabria",
    "Consejería de Economía, Empresa y Empleo",
    "Instituto de Promoción Exterior de Castilla-La Mancha",
    "Departamento de Empresa y Trabajo",
    "Departamento de Acción Climática, Alimentación y Agenda Rural",
    "Conselleria de Política Territorial, Obras Públicas y Movilidad",
];

const LEGISLATIVE_EXAMPLE: &str = r#"{
  "iniciativas": [
    {
      "id": "PL-2024-15",
      "tipo_iniciativa": "Proyecto de ley",
      "titulo_iniciativa": "Ley de fomento de la movilidad sostenible",
      "sector": "Movilidad",
      "subsector": "Movilidad - Movilidad Sostenible",
      "tema": "Sostenibilidad",
      "marco_geografico": "Nacional",
      "fuente": "Congreso",
      "proponente": "Gobierno",
      "fecha": "2024-05-20"
    },
    {
      "id": "No especificado",
      "tipo_iniciativa": "Proposición no de ley",
      "titulo_iniciativa": "Impulso a la digitalización del sector salud",
      "sector": "Salud",
      "subsector": "Salud - Digitalización",
      "tema": "Digitalización",
      "marco_geografico": "Europeo",
      "fuente": "Parlamento Europeo",
      "proponente": "Grupo Socialista",
      "fecha": "No especificado"
    }
  ]
}"#;

const NORMATIVE_EXAMPLE: &str = r#"{
  "iniciativas": [
    {
      "id": "BOE-A-2024-12345",
      "tipo_iniciativa": "Orden",
      "titulo_iniciativa": "Orden por la que se establecen bases reguladoras de subvenciones a la eficiencia energética",
      "sector": "Energía",
      "subsector": "Energía - Eficiencia Energética",
      "tema": "Subvenciones a eficiencia energética en pymes",
      "marco_geografico": "Nacional",
      "fuente": "Consejo de Ministros",
      "proponente": "Gobierno de España",
      "subgrupo": "Ministerio para la Transición Ecológica y el Reto Demográfico",
      "fecha": "2024-05-20"
    },
    {
      "id": "DOG-2024-9876",
      "tipo_iniciativa": "Resolución",
      "titulo_iniciativa": "Resolución por la que se convoca información pública del plan de movilidad",
      "sector": "Movilidad",
      "subsector": "Movilidad - Movilidad Sostenible",
      "tema": "Información pública del plan metropolitano",
      "marco_geografico": "Autonómico",
      "fuente": "Parlamento Autonómico",
      "proponente": "Gobierno de Galicia",
      "subgrupo": "Consellería de Infraestructuras y Movilidad",
      "fecha": "2024-06-10"
    }
  ]
}"#;

fn wording(variant: ExtractionVariant) -> &'static Wording {
    match variant {
        ExtractionVariant::LegislativeInitiatives => &LEGISLATIVE,
        ExtractionVariant::NormativeUpdates => &NORMATIVE,
    }
}

/// Record fields in wire order, with their classification dimension if any
fn fields(variant: ExtractionVariant) -> Vec<(&'static str, Option<Dimension>)> {
    let mut fields = vec![
        ("id", None),
        ("tipo_iniciativa", Some(Dimension::TipoIniciativa)),
        ("titulo_iniciativa", None),
        ("sector", Some(Dimension::Sector)),
        ("subsector", None),
        ("tema", None),
        ("marco_geografico", Some(Dimension::MarcoGeografico)),
        ("fuente", Some(Dimension::Fuente)),
        ("proponente", Some(Dimension::Proponente)),
    ];
    if variant.has_subgroup() {
        fields.push(("subgrupo", None));
    }
    fields.push(("fecha", None));
    fields
}

/// Join as a Spanish enumeration: "a, b y c"
fn enumerate(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} y {}", init.join(", "), last),
    }
}

fn push_block(out: &mut String, tag: &str, lines: &[&str]) {
    let _ = writeln!(out, "<{}>", tag);
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "</{}>", tag);
    out.push('\n');
}

fn render(taxonomies: &TaxonomySet) -> String {
    let variant = taxonomies.variant;
    let wording = wording(variant);
    let fields = fields(variant);
    let closed = |dim: Option<Dimension>| dim.is_some_and(|d| taxonomies.is_closed(d));

    let mut out = String::new();
    let _ = writeln!(out, "{}", wording.intro);
    out.push('\n');

    out.push_str("LISTAS CERRADAS PARA CLASIFICACIÓN:\n\n");
    for taxonomy in &taxonomies.taxonomies {
        let tag = taxonomy.dimension.tag();
        let _ = writeln!(out, "<{}>", tag);
        for value in &taxonomy.values {
            let _ = writeln!(out, "  - {}", value);
        }
        let _ = writeln!(out, "</{}>", tag);
    }
    out.push('\n');

    out.push_str("<INSTRUCCIONES>\n");
    let _ = writeln!(out, "1. {}", wording.identify);
    let _ = writeln!(out, "2. {}", wording.per_item);
    for (name, dim) in &fields {
        let description = match *name {
            "id" => wording.id.to_string(),
            "tipo_iniciativa" => wording.tipo.to_string(),
            "titulo_iniciativa" => wording.titulo.to_string(),
            "subsector" => "Determinar mediante razonamiento según el contenido y los ejemplos. Formato exacto: \"{sector} - {Subsector_determinado_por_ia}\"".to_string(),
            "subgrupo" => "Determinar mediante razonamiento y ejemplos (no lista cerrada). Órgano o entidad impulsora dentro del proponente".to_string(),
            "fecha" => wording.fecha.to_string(),
            "fuente" if closed(*dim) => wording.fuente.to_string(),
            "proponente" if closed(*dim) => "Seleccionar de la lista cerrada proporcionada".to_string(),
            _ if closed(*dim) => "Clasificar según la lista cerrada".to_string(),
            _ => "Determinar mediante razonamiento y ejemplos (no lista cerrada)".to_string(),
        };
        let _ = writeln!(out, "- {}: {}", name, description);
    }
    out.push('\n');
    let _ = writeln!(out, "3. Si un campo no puede determinarse del texto, usa \"{}\"", SENTINEL);
    out.push_str("4. Devuelve ÚNICAMENTE un JSON válido sin texto adicional\n");
    out.push_str("</INSTRUCCIONES>\n\n");

    push_block(&mut out, "EJEMPLOS_DE_SUBSECTOR", SUBSECTOR_EXAMPLES);
    push_block(&mut out, "EJEMPLOS_DE_TEMA", TOPIC_EXAMPLES);
    if variant.has_subgroup() {
        push_block(&mut out, "EJEMPLOS_DE_SUBGRUPO", SUBGROUP_EXAMPLES);
    } else {
        push_block(&mut out, "EJEMPLOS_DE_PROPONENTE", PROPONENT_EXAMPLES);
    }

    out.push_str("<FORMATO_DE_RESPUESTA>\n{\n  \"iniciativas\": [\n    {\n");
    for (idx, (name, dim)) in fields.iter().enumerate() {
        let shape = if closed(*dim) {
            format!("valor de la lista cerrada o '{}'", SENTINEL)
        } else if *name == "fecha" {
            format!("YYYY-MM-DD | '{}'", SENTINEL)
        } else {
            format!("string | '{}'", SENTINEL)
        };
        let comma = if idx + 1 < fields.len() { "," } else { "" };
        let _ = writeln!(out, "      \"{}\": \"{}\"{}", name, shape, comma);
    }
    let _ = writeln!(out, "    }}\n    {}\n  ]\n}}", wording.more);
    out.push_str("</FORMATO_DE_RESPUESTA>\n\n");

    out.push_str("<EJEMPLO_DE_RESPUESTA>\n");
    out.push_str(wording.example);
    out.push_str("\n</EJEMPLO_DE_RESPUESTA>\n\n");

    let closed_names: Vec<&str> = fields
        .iter()
        .filter(|(_, dim)| closed(*dim))
        .map(|(name, _)| *name)
        .collect();
    let free_names: Vec<&str> = fields
        .iter()
        .filter(|(_, dim)| !closed(*dim))
        .map(|(name, _)| *name)
        .filter(|name| !matches!(*name, "id" | "titulo_iniciativa" | "fecha"))
        .collect();

    out.push_str("IMPORTANTE:\n");
    let _ = writeln!(
        out,
        "- Usa SOLO los valores de las listas cerradas proporcionadas para: {}",
        enumerate(&closed_names)
    );
    let _ = writeln!(
        out,
        "- Determina mediante razonamiento y basándote en los ejemplos: {}",
        enumerate(&free_names)
    );
    out.push_str("- Si encuentras múltiples iniciativas, incluye todas\n");
    out.push_str("- Mantén consistencia en la nomenclatura\n");
    out.push_str("- No inventes información que no esté en el documento");

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legislative() -> PromptBuilder {
        PromptBuilder::new(Arc::new(TaxonomySet::legislative()))
    }

    fn normative() -> PromptBuilder {
        PromptBuilder::new(Arc::new(TaxonomySet::normative()))
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let body = "Boletín Oficial de las Cortes Generales, serie A";
        let first = legislative().build(body);
        let second = legislative().build(body);
        assert_eq!(first, second);
        assert_eq!(first.hash.len(), 64);
    }

    #[test]
    fn test_hash_depends_on_taxonomy() {
        assert_ne!(legislative().hash(), normative().hash());

        let mut altered = TaxonomySet::legislative();
        altered.taxonomies[0].values.push("Astronáutica".to_string());
        let altered = PromptBuilder::new(Arc::new(altered));
        assert_ne!(legislative().hash(), altered.hash());
    }

    #[test]
    fn test_sections_in_order() {
        let builder = legislative();
        let text = builder.instructions();
        let positions: Vec<usize> = [
            "LISTAS CERRADAS PARA CLASIFICACIÓN:",
            "<INSTRUCCIONES>",
            "<EJEMPLOS_DE_SUBSECTOR>",
            "<EJEMPLOS_DE_TEMA>",
            "<EJEMPLOS_DE_PROPONENTE>",
            "<FORMATO_DE_RESPUESTA>",
            "<EJEMPLO_DE_RESPUESTA>",
            "IMPORTANTE:",
        ]
        .iter()
        .map(|marker| text.find(marker).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_closed_lists_rendered_as_tagged_blocks() {
        let builder = legislative();
        let text = builder.instructions();
        assert!(text.contains("<SECTOR>\n  - Alimentación\n"));
        assert!(text.contains("</MARCO_GEOGRAFICO>"));
        assert!(text.contains("  - Proyecto de ley\n"));
        assert!(!text.contains("<PROPONENTE>"));
    }

    #[test]
    fn test_legislative_instructions() {
        let builder = legislative();
        let text = builder.instructions();
        assert!(text.contains("- proponente: Determinar mediante razonamiento y ejemplos (no lista cerrada)"));
        assert!(text.contains("para: tipo_iniciativa, sector, marco_geografico y fuente"));
        assert!(text.contains("ejemplos: subsector, tema y proponente"));
        assert!(!text.contains("subgrupo"));
    }

    #[test]
    fn test_normative_instructions() {
        let builder = normative();
        let text = builder.instructions();
        assert!(text.contains("<PROPONENTE>\n  - Gobierno de España\n"));
        assert!(text.contains("<EJEMPLOS_DE_SUBGRUPO>"));
        assert!(!text.contains("<EJEMPLOS_DE_PROPONENTE>"));
        assert!(text.contains("\"subgrupo\": \"string | 'No especificado'\""));
        assert!(text.contains("para: tipo_iniciativa, sector, marco_geografico, fuente y proponente"));
        assert!(text.contains("ejemplos: subsector, tema y subgrupo"));
    }

    #[test]
    fn test_worked_examples_are_valid_json() {
        for example in [LEGISLATIVE_EXAMPLE, NORMATIVE_EXAMPLE] {
            let value: serde_json::Value = serde_json::from_str(example).unwrap();
            assert_eq!(value["iniciativas"].as_array().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_worked_examples_use_taxonomy_values() {
        let cases = [
            (LEGISLATIVE_EXAMPLE, TaxonomySet::legislative()),
            (NORMATIVE_EXAMPLE, TaxonomySet::normative()),
        ];
        for (example, taxonomies) in cases {
            let value: serde_json::Value = serde_json::from_str(example).unwrap();
            for record in value["iniciativas"].as_array().unwrap() {
                for dimension in taxonomies.closed_dimensions() {
                    let field = record[dimension.field_name()].as_str().unwrap();
                    assert!(taxonomies.admits(dimension, field), "{} = {}", dimension, field);
                }
            }
        }
    }

    #[test]
    fn test_user_message_framing() {
        let prompt = legislative().build("texto del boletín");
        assert_eq!(prompt.user, "<DOCUMENTO>texto del boletín</DOCUMENTO>");
        assert!(!prompt.system.contains("texto del boletín"));
    }

    #[test]
    fn test_enumerate() {
        assert_eq!(enumerate(&[]), "");
        assert_eq!(enumerate(&["a"]), "a");
        assert_eq!(enumerate(&["a", "b", "c"]), "a, b y c");
    }
}
