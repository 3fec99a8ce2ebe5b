#![forbid(unsafe_code)]

use serde::Serialize;

use crate::tasks::{self, TaskDefinition};
use crate::StaticText;

/// Read-only capability bundle attachable to a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleModuleDefinition {
    pub code: &'static str,
    pub label: StaticText,
    pub description: StaticText,
    pub icon: &'static str,
    pub tasks: &'static [&'static str],
}

static ROLE_MODULES: &[RoleModuleDefinition] = &[
    RoleModuleDefinition {
        code: "direction",
        label: StaticText::new("Direction", "Leadership"),
        description: StaticText::new(
            "Supervision générale du poste diplomatique",
            "General oversight of the diplomatic post",
        ),
        icon: "Crown",
        tasks: &[
            "requests.view",
            "requests.validate",
            "requests.assign",
            "documents.view",
            "documents.validate",
            "documents.generate",
            "appointments.view",
            "profiles.view",
            "profiles.manage",
            "finance.view",
            "finance.manage",
            "team.view",
            "team.manage",
            "team.assign_roles",
            "settings.view",
            "settings.manage",
            "analytics.view",
            "analytics.export",
            "communication.publish",
            "communication.notify",
        ],
    },
    RoleModuleDefinition {
        code: "management",
        label: StaticText::new("Encadrement", "Management"),
        description: StaticText::new(
            "Gestion des opérations courantes et supervision des agents",
            "Daily operations management and agent supervision",
        ),
        icon: "ClipboardList",
        tasks: &[
            "requests.view",
            "requests.validate",
            "requests.assign",
            "requests.complete",
            "documents.view",
            "documents.validate",
            "appointments.view",
            "appointments.manage",
            "profiles.view",
            "team.view",
            "team.manage",
            "analytics.view",
            "communication.publish",
        ],
    },
    RoleModuleDefinition {
        code: "request_processing",
        label: StaticText::new("Traitement des demandes", "Request processing"),
        description: StaticText::new(
            "Instruction et traitement des demandes courantes",
            "Processing and handling of standard requests",
        ),
        icon: "FileEdit",
        tasks: &[
            "requests.view",
            "requests.create",
            "requests.process",
            "requests.complete",
            "documents.view",
            "documents.validate",
            "appointments.view",
            "appointments.manage",
            "profiles.view",
        ],
    },
    RoleModuleDefinition {
        code: "validation",
        label: StaticText::new("Validation", "Validation"),
        description: StaticText::new(
            "Vérification et validation des documents et demandes",
            "Verification and validation of documents and requests",
        ),
        icon: "CheckCircle",
        tasks: &[
            "requests.view",
            "requests.validate",
            "documents.view",
            "documents.validate",
            "documents.generate",
            "profiles.view",
        ],
    },
    RoleModuleDefinition {
        code: "civil_status",
        label: StaticText::new("État civil", "Civil status"),
        description: StaticText::new(
            "Gestion des actes d'état civil",
            "Civil status records management",
        ),
        icon: "ScrollText",
        tasks: &[
            "civil_status.transcribe",
            "civil_status.register",
            "civil_status.certify",
            "requests.view",
            "requests.process",
            "documents.view",
            "documents.validate",
            "documents.generate",
            "profiles.view",
        ],
    },
    RoleModuleDefinition {
        code: "passports",
        label: StaticText::new("Passeports", "Passports"),
        description: StaticText::new(
            "Gestion des demandes de passeport et biométrie",
            "Passport applications and biometrics management",
        ),
        icon: "BookOpen",
        tasks: &[
            "passports.process",
            "passports.biometric",
            "passports.deliver",
            "requests.view",
            "requests.process",
            "documents.view",
            "documents.validate",
            "profiles.view",
            "appointments.view",
        ],
    },
    RoleModuleDefinition {
        code: "visas",
        label: StaticText::new("Visas", "Visas"),
        description: StaticText::new("Instruction et délivrance des visas", "Visa processing and issuance"),
        icon: "Stamp",
        tasks: &[
            "visas.process",
            "visas.approve",
            "visas.stamp",
            "requests.view",
            "requests.process",
            "documents.view",
            "documents.validate",
            "profiles.view",
            "appointments.view",
        ],
    },
    RoleModuleDefinition {
        code: "finance",
        label: StaticText::new("Finances", "Finance"),
        description: StaticText::new(
            "Gestion financière et comptabilité consulaire",
            "Financial management and consular accounting",
        ),
        icon: "Wallet",
        tasks: &[
            "finance.view",
            "finance.collect",
            "finance.manage",
            "analytics.view",
            "analytics.export",
        ],
    },
    RoleModuleDefinition {
        code: "communication",
        label: StaticText::new("Communication", "Communication"),
        description: StaticText::new(
            "Publications et notifications aux usagers",
            "Publications and user notifications",
        ),
        icon: "Megaphone",
        tasks: &["communication.publish", "communication.notify", "analytics.view"],
    },
    RoleModuleDefinition {
        code: "culture_events",
        label: StaticText::new("Culture et événements", "Culture & events"),
        description: StaticText::new(
            "Organisation des événements culturels et communication associée",
            "Cultural events organization and related outreach",
        ),
        icon: "PartyPopper",
        tasks: &[
            "communication.publish",
            "communication.notify",
            "appointments.view",
            "appointments.manage",
            "profiles.view",
        ],
    },
    RoleModuleDefinition {
        code: "reception",
        label: StaticText::new("Accueil", "Reception"),
        description: StaticText::new(
            "Accueil du public et prise de rendez-vous",
            "Public reception and appointment scheduling",
        ),
        icon: "HandHelping",
        tasks: &[
            "requests.view",
            "requests.create",
            "appointments.view",
            "appointments.manage",
            "profiles.view",
        ],
    },
    RoleModuleDefinition {
        code: "consultation",
        label: StaticText::new("Consultation", "Read-only access"),
        description: StaticText::new(
            "Accès en lecture seule aux données du poste",
            "Read-only access to post data",
        ),
        icon: "Eye",
        tasks: &[
            "requests.view",
            "documents.view",
            "appointments.view",
            "profiles.view",
            "analytics.view",
        ],
    },
    RoleModuleDefinition {
        code: "intelligence",
        label: StaticText::new("Renseignement", "Intelligence"),
        description: StaticText::new("Gestion des notes de renseignement", "Intelligence notes management"),
        icon: "ShieldAlert",
        tasks: &["intelligence.view", "intelligence.manage", "profiles.view"],
    },
    RoleModuleDefinition {
        code: "system_admin",
        label: StaticText::new("Administration système", "System administration"),
        description: StaticText::new(
            "Configuration technique et gestion des accès",
            "Technical configuration and access management",
        ),
        icon: "Settings",
        tasks: &[
            "settings.view",
            "settings.manage",
            "team.view",
            "team.manage",
            "team.assign_roles",
            "analytics.view",
            "analytics.export",
        ],
    },
];

pub fn list_role_modules() -> &'static [RoleModuleDefinition] {
    ROLE_MODULES
}

pub fn role_module(code: &str) -> Option<&'static RoleModuleDefinition> {
    ROLE_MODULES.iter().find(|m| m.code == code)
}

pub fn is_known_module(code: &str) -> bool {
    role_module(code).is_some()
}

/// Tasks granted by one module; empty for an unknown code.
pub fn module_tasks(code: &str) -> Vec<&'static TaskDefinition> {
    role_module(code)
        .map(|m| m.tasks.iter().filter_map(|t| tasks::task(t)).collect())
        .unwrap_or_default()
}

/// Union of the tasks granted by `module_codes`, first occurrence wins the slot.
pub fn resolve_position_tasks(module_codes: &[String]) -> Vec<&'static TaskDefinition> {
    let mut out: Vec<&'static TaskDefinition> = Vec::new();
    for code in module_codes {
        for t in module_tasks(code) {
            if !out.iter().any(|seen| seen.code == t.code) {
                out.push(t);
            }
        }
    }
    out
}
