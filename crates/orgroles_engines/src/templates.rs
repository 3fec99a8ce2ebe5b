#![forbid(unsafe_code)]

use orgroles_kernel_contracts::catalog::{PositionGrade, TemplateType};
use serde::Serialize;

use crate::StaticText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedPosition {
    /// Template-local key; only used to filter derived templates. Org codes are derived from the title.
    pub key: &'static str,
    pub title: StaticText,
    pub description: StaticText,
    pub level: u32,
    pub grade: Option<PositionGrade>,
    pub ministry_code: Option<&'static str>,
    pub role_module_codes: &'static [&'static str],
    pub is_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinistryGroupSeed {
    pub code: &'static str,
    pub label: StaticText,
    pub description: StaticText,
    pub icon: &'static str,
    pub sort_order: i64,
    pub parent_code: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizationTemplate {
    pub template_type: TemplateType,
    pub label: StaticText,
    pub description: StaticText,
    pub icon: &'static str,
    positions: &'static [SeedPosition],
    max_level: Option<u32>,
    excluded_keys: &'static [&'static str],
    pub ministry_groups: &'static [MinistryGroupSeed],
}

impl OrganizationTemplate {
    /// Seed positions in declaration order, after this template's level cap and exclusions.
    pub fn seed_positions(&self) -> Vec<&'static SeedPosition> {
        self.positions
            .iter()
            .filter(|p| self.max_level.map_or(true, |max| p.level <= max))
            .filter(|p| !self.excluded_keys.contains(&p.key))
            .collect()
    }

    pub fn ministry_group(&self, code: &str) -> Option<&'static MinistryGroupSeed> {
        self.ministry_groups.iter().find(|g| g.code == code)
    }
}

#[allow(clippy::too_many_arguments)]
const fn seed(
    key: &'static str,
    title: (&'static str, &'static str),
    description: (&'static str, &'static str),
    level: u32,
    grade: Option<PositionGrade>,
    ministry_code: Option<&'static str>,
    role_module_codes: &'static [&'static str],
    is_required: bool,
) -> SeedPosition {
    SeedPosition {
        key,
        title: StaticText::new(title.0, title.1),
        description: StaticText::new(description.0, description.1),
        level,
        grade,
        ministry_code,
        role_module_codes,
        is_required,
    }
}

const CHIEF: Option<PositionGrade> = Some(PositionGrade::Chief);
const COUNSELOR: Option<PositionGrade> = Some(PositionGrade::Counselor);
const AGENT: Option<PositionGrade> = Some(PositionGrade::Agent);
const EXTERNAL: Option<PositionGrade> = Some(PositionGrade::External);

static EMBASSY_MINISTRY_GROUPS: &[MinistryGroupSeed] = &[
    MinistryGroupSeed { code: "presidence", label: StaticText::new("Présidence", "Presidency"), description: StaticText::new("Cabinet de la Présidence", "Presidency Cabinet"), icon: "Landmark", sort_order: 1, parent_code: None },
    MinistryGroupSeed { code: "mae", label: StaticText::new("Affaires Étrangères", "Foreign Affairs"), description: StaticText::new("Ministère des Affaires Étrangères", "Ministry of Foreign Affairs"), icon: "Globe", sort_order: 2, parent_code: None },
    MinistryGroupSeed { code: "finances", label: StaticText::new("Finances", "Finance"), description: StaticText::new("Ministère des Finances", "Ministry of Finance"), icon: "Wallet", sort_order: 3, parent_code: None },
    MinistryGroupSeed { code: "tresor_public", label: StaticText::new("Trésor Public", "Public Treasury"), description: StaticText::new("Direction du Trésor Public", "Public Treasury Department"), icon: "Building2", sort_order: 4, parent_code: Some("finances") },
    MinistryGroupSeed { code: "direction_budget", label: StaticText::new("Direction du Budget", "Budget Department"), description: StaticText::new("Direction Générale du Budget", "General Budget Department"), icon: "BarChart3", sort_order: 5, parent_code: Some("finances") },
    MinistryGroupSeed { code: "defense", label: StaticText::new("Défense", "Defense"), description: StaticText::new("Ministère de la Défense", "Ministry of Defense"), icon: "Shield", sort_order: 6, parent_code: None },
    MinistryGroupSeed { code: "interieur", label: StaticText::new("Intérieur", "Interior"), description: StaticText::new("Ministère de l'Intérieur", "Ministry of the Interior"), icon: "Lock", sort_order: 7, parent_code: None },
];

static EMBASSY_POSITIONS: &[SeedPosition] = &[
    seed("ambassador", ("Ambassadeur", "Ambassador"), ("Chef de mission diplomatique", "Head of diplomatic mission"), 1, CHIEF, Some("presidence"), &["direction", "intelligence"], true),
    seed("first_counselor", ("Premier Conseiller", "First Counselor"), ("Adjoint du chef de mission", "Deputy head of mission"), 2, COUNSELOR, Some("mae"), &["management", "validation", "communication"], true),
    seed("economic_counselor", ("Conseiller Économique", "Economic Counselor"), ("Chargé des affaires économiques", "In charge of economic affairs"), 3, COUNSELOR, Some("mae"), &["consultation", "communication"], false),
    seed("social_counselor", ("Conseiller Social", "Social Counselor"), ("Chargé des affaires sociales", "In charge of social affairs"), 3, COUNSELOR, Some("mae"), &["request_processing", "validation"], false),
    seed("communication_counselor", ("Conseiller Communication", "Communication Counselor"), ("Chargé de la communication", "In charge of communications"), 3, COUNSELOR, Some("mae"), &["communication", "consultation"], false),
    seed("first_secretary", ("Premier Secrétaire", "First Secretary"), ("Secrétaire de chancellerie", "Chancellery secretary"), 4, AGENT, Some("mae"), &["request_processing", "communication"], false),
    seed("receptionist", ("Réceptionniste", "Receptionist"), ("Accueil du public", "Public reception"), 6, EXTERNAL, Some("mae"), &["reception"], false),
    seed("chancellor", ("Chancelier", "Chancellor"), ("Responsable administratif et financier", "Administrative and financial manager"), 4, AGENT, Some("tresor_public"), &["management", "finance", "system_admin"], true),
    seed("paymaster", ("Payeur", "Paymaster"), ("Agent comptable et financier", "Accounting and financial agent"), 5, AGENT, Some("direction_budget"), &["finance"], false),
    seed("defense_attache", ("Attaché de Défense", "Defense Attaché"), ("Représentant militaire", "Military representative"), 3, COUNSELOR, Some("defense"), &["intelligence", "consultation"], false),
    seed("security_attache", ("Attaché de Sécurité", "Security Attaché"), ("Représentant de la sécurité intérieure", "Interior security representative"), 3, COUNSELOR, Some("interieur"), &["intelligence", "consultation"], false),
];

static CONSULATE_POSITIONS: &[SeedPosition] = &[
    seed("consul_general", ("Consul Général", "Consul General"), ("Chef du poste consulaire", "Head of consular post"), 1, None, None, &["direction", "validation"], true),
    seed("consul", ("Consul", "Consul"), ("Consul adjoint", "Deputy consul"), 2, None, None, &["management", "validation", "civil_status"], false),
    seed("vice_consul", ("Vice-Consul", "Vice Consul"), ("Responsable des affaires consulaires", "Consular affairs manager"), 3, None, None, &["validation", "request_processing", "civil_status"], true),
    seed("chancellor", ("Chancelier", "Chancellor"), ("Responsable administratif et financier", "Administrative and financial manager"), 3, None, None, &["management", "finance", "system_admin"], true),
    seed("head_of_chancellery", ("Chef de Chancellerie", "Head of Chancellery"), ("Responsable des opérations de chancellerie", "Head of chancellery operations"), 3, AGENT, None, &["management", "request_processing", "finance"], false),
    seed("consular_affairs_officer", ("Agent des Affaires Consulaires", "Consular Affairs Officer"), ("Agent chargé des demandes consulaires", "Agent handling consular requests"), 4, None, None, &["request_processing", "validation", "passports"], false),
    seed("civil_status_officer", ("Officier d'État Civil", "Civil Status Officer"), ("Officier chargé de l'état civil", "Officer in charge of civil status"), 4, None, None, &["civil_status", "request_processing"], true),
    seed("passport_officer", ("Agent Passeports", "Passport Officer"), ("Agent chargé des passeports", "Agent handling passports"), 4, None, None, &["passports", "request_processing"], false),
    seed("visa_officer", ("Agent Visas", "Visa Officer"), ("Agent chargé des visas", "Agent handling visas"), 4, None, None, &["visas", "request_processing"], false),
    seed("economic_counselor", ("Conseiller Économique", "Economic Counselor"), ("Chargé des affaires économiques", "In charge of economic affairs"), 3, COUNSELOR, None, &["consultation", "communication"], false),
    seed("communication_counselor", ("Conseiller Communication", "Communication Counselor"), ("Chargé de la communication", "In charge of communications"), 3, COUNSELOR, None, &["communication", "consultation"], false),
    seed("secretary", ("Secrétaire", "Secretary"), ("Secrétaire administrative", "Administrative secretary"), 5, AGENT, None, &["request_processing", "reception"], false),
    seed("consular_agent", ("Agent Consulaire", "Consular Agent"), ("Agent polyvalent", "General consular agent"), 5, None, None, &["request_processing"], true),
    seed("reception_agent", ("Agent d'Accueil", "Reception Agent"), ("Agent d'accueil du public", "Public reception agent"), 6, None, None, &["reception"], false),
    seed("intern", ("Stagiaire", "Intern"), ("Stagiaire en observation", "Observation intern"), 7, None, None, &["consultation"], false),
];

static HONORARY_CONSULATE_POSITIONS: &[SeedPosition] = &[
    seed("honorary_consul", ("Consul Honoraire", "Honorary Consul"), ("Représentant honoraire", "Honorary representative"), 1, None, None, &["direction", "communication"], true),
    seed("assistant", ("Assistant", "Assistant"), ("Assistant du consul honoraire", "Honorary consul assistant"), 2, None, None, &["request_processing", "reception"], false),
    seed("agent", ("Agent", "Agent"), ("Agent d'accueil", "Reception agent"), 3, None, None, &["reception", "consultation"], false),
];

static HIGH_COMMISSION_POSITIONS: &[SeedPosition] = &[
    seed("high_commissioner", ("Haut-Commissaire", "High Commissioner"), ("Chef du Haut-Commissariat", "Head of High Commission"), 1, None, None, &["direction", "intelligence"], true),
    seed("deputy_high_commissioner", ("Haut-Commissaire Adjoint", "Deputy High Commissioner"), ("Adjoint du Haut-Commissaire", "Deputy to the High Commissioner"), 2, None, None, &["management", "validation", "communication"], true),
    seed("counselor", ("Conseiller", "Counselor"), ("Conseiller du Haut-Commissariat", "High Commission Counselor"), 3, None, None, &["management", "consultation"], false),
    seed("first_secretary", ("Premier Secrétaire", "First Secretary"), ("Secrétaire de chancellerie", "Chancellery secretary"), 4, None, None, &["request_processing", "communication"], false),
    seed("chancellor", ("Chancelier", "Chancellor"), ("Responsable administratif et financier", "Administrative and financial manager"), 4, None, None, &["management", "finance", "system_admin"], true),
    seed("consular_section_head", ("Chef de Section Consulaire", "Consular Section Head"), ("Responsable de la section consulaire", "Head of consular section"), 4, None, None, &["request_processing", "validation", "civil_status"], false),
    seed("consular_agent", ("Agent Consulaire", "Consular Agent"), ("Agent polyvalent", "General consular agent"), 5, None, None, &["request_processing"], true),
    seed("receptionist", ("Réceptionniste", "Receptionist"), ("Accueil du public", "Public reception"), 6, None, None, &["reception"], false),
];

static PERMANENT_MISSION_POSITIONS: &[SeedPosition] = &[
    seed("permanent_representative", ("Représentant Permanent", "Permanent Representative"), ("Chef de la Mission Permanente", "Head of Permanent Mission"), 1, None, None, &["direction", "intelligence"], true),
    seed("deputy_representative", ("Représentant Permanent Adjoint", "Deputy Permanent Representative"), ("Adjoint du Représentant Permanent", "Deputy to the Permanent Representative"), 2, None, None, &["management", "validation", "communication"], false),
    seed("counselor", ("Conseiller", "Counselor"), ("Conseiller de la Mission", "Mission Counselor"), 3, None, None, &["management", "consultation"], true),
    seed("first_secretary", ("Premier Secrétaire", "First Secretary"), ("Secrétaire de la Mission", "Mission Secretary"), 4, None, None, &["request_processing", "communication"], false),
    seed("attache", ("Attaché", "Attaché"), ("Attaché de la Mission", "Mission Attaché"), 5, None, None, &["request_processing", "consultation"], false),
];

static TEMPLATES: &[OrganizationTemplate] = &[
    OrganizationTemplate {
        template_type: TemplateType::Embassy,
        label: StaticText::new("Ambassade", "Embassy"),
        description: StaticText::new("Représentation diplomatique complète", "Full diplomatic representation"),
        icon: "Landmark",
        positions: EMBASSY_POSITIONS,
        max_level: None,
        excluded_keys: &[],
        ministry_groups: EMBASSY_MINISTRY_GROUPS,
    },
    OrganizationTemplate {
        template_type: TemplateType::GeneralConsulate,
        label: StaticText::new("Consulat Général", "General Consulate"),
        description: StaticText::new("Poste consulaire de première catégorie", "First-class consular post"),
        icon: "Building",
        positions: CONSULATE_POSITIONS,
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::Consulate,
        label: StaticText::new("Consulat", "Consulate"),
        description: StaticText::new("Poste consulaire standard", "Standard consular post"),
        icon: "Home",
        positions: CONSULATE_POSITIONS,
        max_level: Some(5),
        excluded_keys: &["visa_officer"],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::PermanentMission,
        label: StaticText::new("Mission Permanente", "Permanent Mission"),
        description: StaticText::new(
            "Mission auprès d'une organisation internationale",
            "Mission to an international organization",
        ),
        icon: "Globe",
        positions: PERMANENT_MISSION_POSITIONS,
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::HonoraryConsulate,
        label: StaticText::new("Consulat Honoraire", "Honorary Consulate"),
        description: StaticText::new("Représentation consulaire honoraire", "Honorary consular representation"),
        icon: "Award",
        positions: HONORARY_CONSULATE_POSITIONS,
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::HighCommission,
        label: StaticText::new("Haut-Commissariat", "High Commission"),
        description: StaticText::new("Représentation de type Commonwealth", "Commonwealth-type representation"),
        icon: "Landmark",
        positions: HIGH_COMMISSION_POSITIONS,
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::ThirdParty,
        label: StaticText::new("Partenaire Tiers", "Third Party"),
        description: StaticText::new("Organisation partenaire externe", "External partner organization"),
        icon: "Handshake",
        positions: &[],
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::Other,
        label: StaticText::new("Autre", "Other"),
        description: StaticText::new("Autre type d'organisation", "Other organization type"),
        icon: "Wrench",
        positions: &[],
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
    OrganizationTemplate {
        template_type: TemplateType::Custom,
        label: StaticText::new("Personnalisé", "Custom"),
        description: StaticText::new("Configuration entièrement personnalisée", "Fully custom configuration"),
        icon: "Settings",
        positions: &[],
        max_level: None,
        excluded_keys: &[],
        ministry_groups: &[],
    },
];

pub fn list_templates() -> &'static [OrganizationTemplate] {
    TEMPLATES
}

pub fn template(template_type: TemplateType) -> Option<&'static OrganizationTemplate> {
    TEMPLATES.iter().find(|t| t.template_type == template_type)
}

/// Looks a template up by its wire name (`embassy`, `general_consulate`, ...).
pub fn template_by_name(name: &str) -> Option<&'static OrganizationTemplate> {
    TemplateType::parse(name).and_then(template)
}
