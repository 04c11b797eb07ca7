//! Built-in catalog for French financial-advisory (CIF) dossier audits.

use audit_core::{DocumentTemplate, MatchRule, QuestionSpec, Taxonomy};

use crate::catalog::Catalog;
use crate::control::{ControlDefinition, Variant, VariantRule};

pub const LCB_FT: &str = "lcb-ft";
pub const NEW_CLIENT: &str = "nouveau-client";
pub const OPERATION: &str = "operation";
pub const FINANCING: &str = "financement";

const MEDIUM: [&str; 2] = ["Papier", "Électronique"];

/// The opening question shared by every document: absent ends the document.
fn presence(prompt: &str) -> QuestionSpec {
    QuestionSpec::boolean(prompt).skip_on(["Non"])
}

fn identity_card() -> DocumentTemplate {
    DocumentTemplate::new(
        "piece-identite",
        "Pièce d'identité",
        vec![
            QuestionSpec::boolean("La pièce d'identité est-elle présente au dossier ?")
                .skip_on(["Non"])
                .with_quality(
                    "Contrôle de la copie",
                    ["Lisible", "Recto-verso", "Non tronquée"],
                ),
            QuestionSpec::taxonomy("Support du document", Taxonomy::DocumentMedium, MEDIUM),
            QuestionSpec::date("Date d'expiration de la pièce"),
            QuestionSpec::boolean("La pièce était-elle en cours de validité à l'entrée en relation ?"),
            QuestionSpec::checklist(
                "Mentions illisibles ou manquantes",
                ["Photographie", "Nom", "Date de naissance", "Numéro de pièce"],
            )
            .follow_up(
                MatchRule::AnySelected,
                QuestionSpec::free_text("Préciser les mentions concernées"),
            ),
        ],
    )
}

fn proof_of_address() -> DocumentTemplate {
    DocumentTemplate::new(
        "justificatif-domicile",
        "Justificatif de domicile",
        vec![
            presence("Le justificatif de domicile est-il présent au dossier ?"),
            QuestionSpec::boolean("Le justificatif date-t-il de moins de trois mois ?"),
            QuestionSpec::taxonomy("Support du document", Taxonomy::DocumentMedium, MEDIUM),
            QuestionSpec::boolean("L'adresse correspond-elle à celle du recueil client ?"),
        ],
    )
}

fn know_your_client() -> DocumentTemplate {
    DocumentTemplate::new(
        "kyc",
        "Recueil d'informations client (KYC)",
        vec![
            presence("Le recueil d'informations client est-il présent au dossier ?"),
            QuestionSpec::boolean("Le recueil est-il signé par le client ?"),
            QuestionSpec::boolean("Le conseiller est-il certifié CIF ?")
                .accepts_no()
                .help("Un conseiller non certifié relève d'un autre parcours, ce n'est pas une anomalie."),
            QuestionSpec::boolean("Un patrimoine net est-il renseigné ?")
                .accepts_no()
                .follow_up(
                    MatchRule::equals("Oui"),
                    QuestionSpec::taxonomy(
                        "Tranche de patrimoine net",
                        Taxonomy::MonetaryBracket,
                        ["< 150 k€", "150 k€ - 750 k€", "750 k€ - 1,5 M€", "> 1,5 M€"],
                    ),
                ),
            QuestionSpec::taxonomy(
                "Origine du profil client",
                Taxonomy::ProfileOrigin,
                [
                    "Questionnaire client",
                    "Entretien conseiller",
                    "Reprise d'un autre établissement",
                ],
            ),
            QuestionSpec::checklist(
                "Rubriques incomplètes",
                [
                    "Situation familiale",
                    "Situation professionnelle",
                    "Revenus",
                    "Patrimoine",
                    "Objectifs",
                ],
            ),
            QuestionSpec::free_text("Commentaire").optional(),
        ],
    )
}

fn risk_profile() -> DocumentTemplate {
    DocumentTemplate::new(
        "profil-risque",
        "Profil de risque",
        vec![
            presence("Le profil de risque est-il présent au dossier ?"),
            QuestionSpec::taxonomy(
                "Niveau de risque retenu",
                Taxonomy::RiskLevel,
                ["Prudent", "Équilibré", "Dynamique", "Offensif"],
            ),
            QuestionSpec::taxonomy(
                "Prise en compte des préférences ESG",
                Taxonomy::EsgRespect,
                ["Non exprimées", "Partielle", "Totale"],
            ),
            QuestionSpec::boolean("Le profil est-il signé et daté par le client ?"),
            QuestionSpec::date("Date de réalisation du profil"),
            QuestionSpec::boolean("Le profil a-t-il été mis à jour depuis moins de deux ans ?")
                .only_for([OPERATION]),
        ],
    )
}

fn origin_of_funds() -> DocumentTemplate {
    DocumentTemplate::new(
        "origine-fonds",
        "Origine des fonds",
        vec![
            QuestionSpec::boolean("L'origine des fonds est-elle documentée ?")
                .allow_na()
                .skip_on(["Non", "N/A"]),
            QuestionSpec::taxonomy(
                "Nature de l'origine des fonds",
                Taxonomy::FundsOrigin,
                [
                    "Épargne",
                    "Héritage",
                    "Cession d'actifs",
                    "Revenus professionnels",
                    "Donation",
                    "Autre",
                ],
            )
            .follow_up(
                MatchRule::equals("Autre"),
                QuestionSpec::free_text("Préciser l'origine des fonds"),
            ),
            QuestionSpec::boolean("Un justificatif de l'origine des fonds est-il joint ?"),
            QuestionSpec::taxonomy(
                "Niveau de vigilance appliqué",
                Taxonomy::VigilanceLevel,
                ["Simplifiée", "Standard", "Renforcée"],
            ),
            QuestionSpec::taxonomy(
                "Déclaration de soupçon",
                Taxonomy::SuspicionDeclaration,
                ["Aucune", "Envisagée", "Effectuée"],
            )
            .visible_if(1, MatchRule::equals("Renforcée")),
        ],
    )
}

fn engagement_letter() -> DocumentTemplate {
    DocumentTemplate::new(
        "lettre-mission",
        "Lettre de mission",
        vec![
            QuestionSpec::boolean("La lettre de mission est-elle présente au dossier ?")
                .skip_on(["Non"])
                .with_quality(
                    "Contenu de la lettre",
                    ["Nature de la prestation", "Modalités de rémunération", "Durée"],
                ),
            QuestionSpec::boolean("La lettre est-elle signée par le client ?"),
            QuestionSpec::boolean("La lettre est-elle signée par le conseiller ?"),
            QuestionSpec::date("Date de signature"),
            QuestionSpec::choice(
                "Mode de rémunération",
                ["Honoraires", "Commissions", "Mixte", "Non précisé"],
            )
            .nonconforming(["Non précisé"]),
        ],
    )
}

fn relationship_document() -> DocumentTemplate {
    DocumentTemplate::new(
        "der",
        "Document d'entrée en relation",
        vec![
            presence("Le document d'entrée en relation est-il présent au dossier ?"),
            QuestionSpec::boolean("Le document a-t-il été remis avant toute prestation ?"),
            QuestionSpec::boolean("Le statut CIF et l'association de rattachement sont-ils mentionnés ?"),
            QuestionSpec::taxonomy(
                "Statut GDA du conseiller",
                Taxonomy::GdaStatus,
                ["Inscrit", "En cours", "Non inscrit"],
            )
            .except_for([LCB_FT]),
        ],
    )
}

fn suitability_report() -> DocumentTemplate {
    DocumentTemplate::new(
        "rapport-adequation",
        "Rapport d'adéquation",
        vec![
            QuestionSpec::boolean("Le rapport d'adéquation est-il présent au dossier ?")
                .skip_on(["Non"])
                .with_quality(
                    "Qualité du rapport",
                    ["Personnalisé", "Daté", "Motivé"],
                ),
            QuestionSpec::boolean("Les recommandations sont-elles cohérentes avec le profil de risque ?"),
            QuestionSpec::boolean("Le rapport est-il signé par le client ?"),
            QuestionSpec::checklist(
                "Mentions manquantes",
                ["Objectifs", "Horizon de placement", "Frais", "Risques"],
            ),
        ],
    )
}

fn operation_form() -> DocumentTemplate {
    DocumentTemplate::new(
        "bulletin-operation",
        "Bulletin d'opération",
        vec![
            presence("Le bulletin d'opération est-il présent au dossier ?"),
            QuestionSpec::taxonomy(
                "Type d'opération",
                Taxonomy::OperationType,
                [
                    "Souscription",
                    "Versement complémentaire",
                    "Rachat partiel",
                    "Rachat total",
                    "Arbitrage",
                ],
            ),
            QuestionSpec::taxonomy(
                "Statut de l'opération",
                Taxonomy::OperationStatus,
                ["En cours", "Réalisée", "Annulée"],
            )
            .skip_on(["Annulée"]),
            QuestionSpec::taxonomy(
                "Montant de l'opération",
                Taxonomy::MonetaryBracket,
                ["< 15 k€", "15 k€ - 150 k€", "> 150 k€"],
            ),
            QuestionSpec::date("Date de l'opération"),
        ],
    )
}

fn redemption_request() -> DocumentTemplate {
    DocumentTemplate::new(
        "demande-rachat",
        "Demande de rachat",
        vec![
            presence("La demande de rachat est-elle présente au dossier ?"),
            QuestionSpec::taxonomy(
                "Motif du rachat",
                Taxonomy::RedemptionMotive,
                [
                    "Besoin de liquidités",
                    "Projet immobilier",
                    "Réorientation de l'épargne",
                    "Autre",
                ],
            )
            .follow_up(
                MatchRule::equals("Autre"),
                QuestionSpec::free_text("Préciser le motif"),
            ),
            QuestionSpec::boolean("Le client a-t-il été informé des conséquences fiscales ?"),
            QuestionSpec::boolean("La demande est-elle signée par le client ?"),
        ],
    )
}

fn controls() -> Vec<ControlDefinition> {
    vec![
        ControlDefinition::new(
            LCB_FT,
            "Lutte contre le blanchiment (LCB-FT)",
            ["piece-identite", "justificatif-domicile", "kyc", "origine-fonds"],
        ),
        ControlDefinition::new(
            NEW_CLIENT,
            "Entrée en relation",
            [
                "piece-identite",
                "justificatif-domicile",
                "der",
                "kyc",
                "profil-risque",
                "lettre-mission",
                "rapport-adequation",
            ],
        ),
        ControlDefinition::new(
            OPERATION,
            "Opération sur contrat",
            ["bulletin-operation", "profil-risque", "rapport-adequation"],
        )
        .with_variants(VariantRule {
            fields: vec!["type_operation".into(), "nature_operation".into()],
            variants: vec![
                Variant {
                    name: "contribution".into(),
                    keywords: vec![
                        "versement".into(),
                        "souscription".into(),
                        "apport".into(),
                    ],
                    documents: vec!["origine-fonds".into()],
                },
                Variant {
                    name: "redemption".into(),
                    keywords: vec!["rachat".into(), "retrait".into()],
                    documents: vec!["demande-rachat".into()],
                },
            ],
        }),
        ControlDefinition::new(
            FINANCING,
            "Financement",
            [
                "piece-identite",
                "justificatif-domicile",
                "kyc",
                "lettre-mission",
                "origine-fonds",
            ],
        ),
    ]
}

impl Catalog {
    /// The catalog shipped with the engine.
    pub fn builtin() -> Self {
        Catalog::from_parts(
            [
                identity_card(),
                proof_of_address(),
                know_your_client(),
                risk_profile(),
                origin_of_funds(),
                engagement_letter(),
                relationship_document(),
                suitability_report(),
                operation_form(),
                redemption_request(),
            ],
            controls(),
        )
    }
}
