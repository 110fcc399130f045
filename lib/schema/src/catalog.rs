//! Built-in review schemas
//!
//! Field keys are the persisted keys and must not be renamed; labels are
//! display text only.

use serde_json::json;

use crate::schema::{Category, FieldConfig, ProductKind, ProductSchema, SchemaCatalog, Section};

pub const SEPARATION_TYPES: &[&str] = &[
    "Tamisage WPFF (Whole Plant Fresh Frozen)",
    "Tamisage à l'eau glacée (Bubble Hash)",
    "Tamisage à la glace carbonique (Ice Hash)",
    "Tamisage à sec (Dry)",
    "Tamisage à sec congelé (Ice Dry)",
    "Séparation électrostatique (Static)",
    "Friction manuelle (Charas)",
    "Séparation par densité",
    "Décantation",
    "Autre",
];

pub const SOLVENT_EXTRACTIONS: &[&str] = &[
    "Extraction à l'éthanol (EHO)",
    "Extraction à l'alcool isopropylique (IPA)",
    "Extraction à l'acétone (AHO)",
    "Extraction au butane (BHO)",
    "Extraction a l'isobutane (IHO)",
    "Extraction au propane (PHO)",
    "Extraction à l'hexane (HHO)",
    "Extraction aux huiles végétales (coco, olive)",
    "Extraction au CO₂ supercritique",
    "Autre",
];

pub const SOLVENTLESS_EXTRACTIONS: &[&str] = &[
    "Pressage à chaud (Rosin)",
    "Pressage à froid",
    "Extraction par ultrasons (UAE)",
    "Extraction assistée par micro-ondes (MAE)",
    "Extraction avec tensioactifs (Tween 20)",
    "Autre",
];

pub const PURIFICATION_METHODS: &[&str] = &[
    "Chromatographie sur colonne",
    "Flash Chromatography",
    "HPLC",
    "GC",
    "TLC",
    "Winterisation",
    "Décarboxylation",
    "Fractionnement par température",
    "Fractionnement par solubilité",
    "Autre",
];

pub const FERTILIZERS: &[&str] = &[
    "Compost",
    "Guano",
    "Farine de sang",
    "Farine d'os",
    "Humus de lombric",
    "NPK minéral",
    "Nitrate de calcium",
    "Sulfate de magnésium",
    "Acides humiques",
    "Mycorhizes",
    "Stimulateur racinaire",
    "Autre",
];

pub const PREPARATION_ACTIONS: &[&str] = &[
    "Mélanger",
    "Chauffer",
    "Refroidir",
    "Cuire",
    "Infuser",
    "Broyer",
    "Tamiser",
    "Laisser reposer",
    "Décarboyler",
    "Extraire",
    "Autre",
];

pub const EFFECT_DURATIONS: &[&str] = &["<15min", "<30min", "<1h", "<2h", "2h+"];

const CULTURE_TYPES: &[&str] = &["Indoor", "Outdoor", "Greenhouse", "Living soil", "Hydroponie"];

const EDIBLE_TYPES: &[&str] = &["Gâteau", "Bonbon", "Chocolat", "Boisson", "Huile", "Autre"];

const EXTRACT_TYPES: &[&str] = &["Distillat", "Full spectrum", "Broad spectrum", "Isolat", "Rosin", "Autre"];

impl SchemaCatalog {
    /// The four product kinds with their sections and category maps; Fleur is the default
    pub fn builtin() -> Self {
        SchemaCatalog::new(
            vec![flower(), hash(), concentrate(), edible()],
            ProductKind::Flower,
        )
    }
}

fn overall_rating() -> FieldConfig {
    FieldConfig::slider("overallRating", "Overall rating", 10.0).with_default(json!(5))
}

/// Taste and Effects sections; `effect_fields` are appended to Effects
fn tasting_sections(effect_fields: Vec<FieldConfig>) -> Vec<Section> {
    let mut effects = vec![
        FieldConfig::slider("montee", "Onset", 10.0),
        FieldConfig::multiselect("effects", "Effects", &[]),
        FieldConfig::select("dureeEffet", "Effect duration", EFFECT_DURATIONS),
    ];
    effects.extend(effect_fields);
    vec![
        Section::new(
            "Taste",
            vec![
                FieldConfig::slider("intensiteFumee", "Smoke intensity", 10.0),
                FieldConfig::slider("agressivite", "Harshness", 10.0),
                FieldConfig::slider("cendre", "Ash", 10.0),
            ],
        ),
        Section::new("Effects", effects),
    ]
}

fn flower() -> ProductSchema {
    let mut sections = vec![
        Section::new(
            "Information",
            vec![
                FieldConfig::text("holderName", "Name").required(),
                FieldConfig::text("cultivars", "Cultivar"),
                FieldConfig::text("breeder", "Breeder"),
                FieldConfig::text("farm", "Farm"),
                FieldConfig::select("typeCulture", "Cultivation", CULTURE_TYPES),
                FieldConfig::text("spectre", "Light spectrum"),
                FieldConfig::multiselect("substrat", "Substrate", &[]),
                FieldConfig::pipeline("fertilization", "Fertilization", FERTILIZERS, None),
                FieldConfig::images("images", "Photos"),
            ],
        ),
        Section::new(
            "Visual",
            vec![
                FieldConfig::slider("densite", "Density", 10.0),
                FieldConfig::slider("trichome", "Trichomes", 10.0),
                FieldConfig::slider("pistil", "Pistils", 10.0),
                FieldConfig::slider("manucure", "Trim", 10.0),
                FieldConfig::slider("moisissure", "Mold", 10.0),
                FieldConfig::slider("graines", "Seeds", 10.0),
            ],
        ),
        Section::new(
            "Smell",
            vec![
                FieldConfig::slider("aromasIntensity", "Aroma intensity", 10.0),
                FieldConfig::multiselect("terpenes", "Terpenes", &[]),
            ],
        ),
        Section::new(
            "Texture",
            vec![
                FieldConfig::slider("durete", "Hardness", 10.0),
                FieldConfig::slider("densiteTexture", "Touch density", 10.0),
                FieldConfig::slider("elasticite", "Elasticity", 10.0),
                FieldConfig::slider("collant", "Stickiness", 10.0),
            ],
        ),
    ];
    sections.extend(tasting_sections(vec![FieldConfig::slider(
        "intensiteEffet",
        "Effect intensity",
        10.0,
    )]));
    sections.push(Section::new(
        "Conclusion",
        vec![
            FieldConfig::textarea("description", "Notes"),
            overall_rating(),
        ],
    ));

    ProductSchema {
        kind: ProductKind::Flower,
        sections,
        categories: vec![
            Category::new(
                "visual",
                "Visual",
                &["densite", "trichome", "pistil", "manucure", "moisissure", "graines"],
            ),
            Category::new("smell", "Smell", &["aromasIntensity"]),
            Category::new(
                "texture",
                "Texture",
                &["durete", "densiteTexture", "elasticite", "collant"],
            ),
            Category::new("taste", "Taste", &["intensiteFumee", "agressivite", "cendre"]),
            Category::new("effects", "Effects", &["montee", "intensiteEffet"]),
        ],
    }
}

fn hash() -> ProductSchema {
    let mut sections = vec![
        Section::new(
            "Information",
            vec![
                FieldConfig::text("holderName", "Name").required(),
                FieldConfig::text("hashmaker", "Hashmaker"),
                FieldConfig::text("farm", "Farm"),
                FieldConfig::multiselect("cultivarsList", "Cultivars", &[]),
                FieldConfig::pipeline(
                    "pipelineSeparation",
                    "Separation pipeline",
                    SEPARATION_TYPES,
                    Some("cultivarsList"),
                ),
                FieldConfig::images("images", "Photos"),
            ],
        ),
        Section::new(
            "Visual",
            vec![
                FieldConfig::slider("couleurTransparence", "Colour / clarity", 10.0),
                FieldConfig::slider("pureteVisuelle", "Visual purity", 10.0),
                FieldConfig::slider("densite", "Density", 10.0),
                FieldConfig::slider("pistils", "Pistils", 10.0),
                FieldConfig::slider("moisissure", "Mold", 10.0),
                FieldConfig::slider("graines", "Seeds", 10.0),
            ],
        ),
        Section::new(
            "Smell",
            vec![
                FieldConfig::slider("fideliteCultivars", "Cultivar fidelity", 10.0),
                FieldConfig::slider("intensiteAromatique", "Aroma intensity", 10.0),
                FieldConfig::multiselect("terpenes", "Terpenes", &[]),
            ],
        ),
        Section::new(
            "Texture",
            vec![
                FieldConfig::slider("durete", "Hardness", 10.0),
                FieldConfig::slider("friabiliteViscosite", "Friability / viscosity", 10.0),
                FieldConfig::slider("meltingResidus", "Melt / residue", 10.0),
                FieldConfig::slider("aspectCollantGras", "Sticky / greasy", 10.0),
            ],
        ),
    ];
    sections.extend(tasting_sections(vec![FieldConfig::slider(
        "intensiteEffet",
        "Effect intensity",
        10.0,
    )]));
    sections.push(Section::new(
        "Conclusion",
        vec![
            FieldConfig::textarea("description", "Notes"),
            overall_rating(),
        ],
    ));

    ProductSchema {
        kind: ProductKind::Hash,
        sections,
        categories: vec![
            Category::new(
                "visual",
                "Visual",
                &[
                    "couleurTransparence",
                    "pureteVisuelle",
                    "densite",
                    "pistils",
                    "moisissure",
                    "graines",
                ],
            ),
            Category::new("smell", "Smell", &["fideliteCultivars", "intensiteAromatique"]),
            Category::new(
                "texture",
                "Texture",
                &["durete", "friabiliteViscosite", "meltingResidus", "aspectCollantGras"],
            ),
            Category::new("taste", "Taste", &["intensiteFumee", "agressivite", "cendre"]),
            Category::new("effects", "Effects", &["montee", "intensiteEffet"]),
        ],
    }
}

fn concentrate() -> ProductSchema {
    let extraction_choices: Vec<&str> = SOLVENT_EXTRACTIONS
        .iter()
        .chain(SOLVENTLESS_EXTRACTIONS)
        .copied()
        .filter(|c| *c != "Autre")
        .chain(std::iter::once("Autre"))
        .collect();

    let sections = vec![
        Section::new(
            "Information",
            vec![
                FieldConfig::text("holderName", "Name").required(),
                FieldConfig::text("hashmaker", "Extractor"),
                FieldConfig::multiselect("cultivarsList", "Cultivars", &[]),
                FieldConfig::select("typeExtraction", "Extraction type", &["Avec solvant", "Sans solvant"]),
                FieldConfig::pipeline(
                    "pipelineExtraction",
                    "Extraction pipeline",
                    &extraction_choices,
                    Some("cultivarsList"),
                ),
                FieldConfig::pipeline(
                    "pipelinePurification",
                    "Purification pipeline",
                    PURIFICATION_METHODS,
                    Some("pipelineExtraction"),
                ),
                FieldConfig::checkbox("purgevide", "Vacuum purge"),
                FieldConfig::images("images", "Photos"),
            ],
        ),
        Section::new(
            "Visual",
            vec![
                FieldConfig::slider("couleur", "Colour", 10.0),
                FieldConfig::slider("viscosite", "Viscosity", 10.0),
                FieldConfig::slider("pureteVisuelle", "Visual purity", 10.0),
                FieldConfig::slider("melting", "Melt", 10.0),
                FieldConfig::slider("residus", "Residue", 10.0),
                FieldConfig::slider("pistils", "Pistils", 10.0),
                FieldConfig::slider("moisissure", "Mold", 10.0),
            ],
        ),
        Section::new(
            "Smell",
            vec![
                FieldConfig::slider("intensiteAromatique", "Aroma intensity", 10.0),
                FieldConfig::multiselect("terpenes", "Terpenes", &[]),
            ],
        ),
        Section::new(
            "Texture",
            vec![
                FieldConfig::slider("durete", "Hardness", 10.0),
                FieldConfig::slider("friabiliteViscosite", "Friability / viscosity", 10.0),
                FieldConfig::slider("densiteTexture", "Touch density", 10.0),
                FieldConfig::slider("viscositeTexture", "Touch viscosity", 10.0),
                FieldConfig::slider("collant", "Stickiness", 10.0),
            ],
        ),
        Section::new(
            "Taste",
            vec![
                FieldConfig::slider("cendre", "Ash", 10.0),
                FieldConfig::slider("textureBouche", "Mouthfeel", 10.0),
                FieldConfig::slider("douceur", "Smoothness", 10.0),
                FieldConfig::slider("intensite", "Intensity", 10.0),
                FieldConfig::slider("intensiteFumee", "Smoke intensity", 10.0),
                FieldConfig::slider("agressivite", "Harshness", 10.0),
            ],
        ),
        Section::new(
            "Effects",
            vec![
                FieldConfig::slider("montee", "Onset", 10.0),
                FieldConfig::slider("intensiteEffets", "Effect intensity", 10.0),
                FieldConfig::multiselect("effects", "Effects", &[]),
                FieldConfig::select("dureeEffet", "Effect duration", EFFECT_DURATIONS),
            ],
        ),
        Section::new(
            "Conclusion",
            vec![
                FieldConfig::textarea("description", "Notes"),
                overall_rating(),
            ],
        ),
    ];

    ProductSchema {
        kind: ProductKind::Concentrate,
        sections,
        categories: vec![
            Category::new(
                "visual",
                "Visual",
                &[
                    "couleur",
                    "viscosite",
                    "pureteVisuelle",
                    "melting",
                    "residus",
                    "pistils",
                    "moisissure",
                ],
            ),
            Category::new("smell", "Smell", &["intensiteAromatique"]),
            Category::new(
                "texture",
                "Texture",
                &[
                    "durete",
                    "friabiliteViscosite",
                    "densiteTexture",
                    "viscositeTexture",
                    "collant",
                ],
            ),
            Category::new(
                "taste",
                "Taste",
                &[
                    "intensiteAromatique",
                    "cendre",
                    "textureBouche",
                    "douceur",
                    "intensite",
                    "intensiteFumee",
                    "agressivite",
                ],
            ),
            Category::new("effects", "Effects", &["montee", "intensiteEffets"]),
        ],
    }
}

fn edible() -> ProductSchema {
    let sections = vec![
        Section::new(
            "Information",
            vec![
                FieldConfig::text("holderName", "Name").required(),
                FieldConfig::text("marque", "Brand"),
                FieldConfig::select("typeComestible", "Edible type", EDIBLE_TYPES),
                FieldConfig::text("cultivars", "Cultivar"),
                FieldConfig::select("typeExtrait", "Extract type", EXTRACT_TYPES),
                FieldConfig::number("thcMg", "THC (mg)", 1000.0),
                FieldConfig::number("cbdMg", "CBD (mg)", 1000.0),
                FieldConfig::recipe("recipe", "Recipe"),
                FieldConfig::images("images", "Photos"),
            ],
        ),
        Section::new(
            "Tasting",
            vec![
                FieldConfig::slider("apparence", "Appearance", 10.0),
                FieldConfig::slider("gout", "Taste", 10.0),
                FieldConfig::slider("texture", "Texture", 10.0),
                FieldConfig::slider("qualiteAlimentaire", "Food quality", 10.0),
                FieldConfig::slider("goutIntensity", "Taste intensity", 10.0),
            ],
        ),
        Section::new(
            "Effects",
            vec![
                FieldConfig::slider("effectsIntensity", "Effect intensity", 10.0),
                FieldConfig::multiselect("effects", "Effects", &[]),
                FieldConfig::select("dureeEffet", "Effect duration", EFFECT_DURATIONS),
            ],
        ),
        Section::new(
            "Conclusion",
            vec![
                FieldConfig::textarea("description", "Notes"),
                overall_rating(),
            ],
        ),
    ];

    ProductSchema {
        kind: ProductKind::Edible,
        sections,
        categories: vec![
            Category::new("taste", "Taste", &["goutIntensity"]),
            Category::new("effects", "Effects", &["effectsIntensity"]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_builtin_is_valid() {
        let catalog = SchemaCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.default_kind, ProductKind::Flower);
        for kind in ProductKind::ALL {
            assert_eq!(catalog.get(kind).kind, kind);
        }
    }

    #[test]
    fn test_edible_has_two_categories() {
        let catalog = SchemaCatalog::builtin();
        assert_eq!(
            catalog.get(ProductKind::Edible).category_names(),
            vec!["taste", "effects"]
        );
        assert_eq!(
            catalog.get(ProductKind::Hash).category_names(),
            vec!["visual", "smell", "texture", "taste", "effects"]
        );
    }

    #[test]
    fn test_every_category_key_is_declared() {
        let catalog = SchemaCatalog::builtin();
        for schema in &catalog.schemas {
            for category in &schema.categories {
                for key in &category.fields {
                    let field = schema.field(key);
                    assert!(field.is_some(), "{} {} missing {}", schema.kind, category.name, key);
                    assert_eq!(field.unwrap().field_type, FieldType::Slider);
                }
            }
        }
    }

    #[test]
    fn test_effect_intensity_sits_in_effects_section() {
        let catalog = SchemaCatalog::builtin();
        for kind in [ProductKind::Flower, ProductKind::Hash] {
            let effects = catalog
                .get(kind)
                .sections
                .iter()
                .find(|s| s.title == "Effects")
                .unwrap();
            let keys: Vec<&str> = effects.fields.iter().map(|f| f.key.as_str()).collect();
            assert_eq!(keys, vec!["montee", "effects", "dureeEffet", "intensiteEffet"], "{}", kind);
        }
    }

    #[test]
    fn test_pipeline_fields_name_their_source() {
        let catalog = SchemaCatalog::builtin();
        let hash = catalog.get(ProductKind::Hash);
        let field = hash.field("pipelineSeparation").unwrap();
        assert_eq!(field.field_type, FieldType::Pipeline);
        assert_eq!(field.source.as_deref(), Some("cultivarsList"));
        assert_eq!(field.choices.len(), SEPARATION_TYPES.len());
    }
}
