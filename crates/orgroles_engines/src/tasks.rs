#![forbid(unsafe_code)]

use serde::Serialize;

use crate::StaticText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskRisk::Low => "low",
            TaskRisk::Medium => "medium",
            TaskRisk::High => "high",
            TaskRisk::Critical => "critical",
        }
    }
}

/// One atomic permission a role module can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskDefinition {
    pub code: &'static str,
    pub label: StaticText,
    pub description: StaticText,
    pub category: &'static str,
    pub risk: TaskRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCategory {
    pub code: &'static str,
    pub label: StaticText,
    pub icon: &'static str,
}

const fn def(
    code: &'static str,
    category: &'static str,
    label: (&'static str, &'static str),
    description: (&'static str, &'static str),
    risk: TaskRisk,
) -> TaskDefinition {
    TaskDefinition {
        code,
        label: StaticText::new(label.0, label.1),
        description: StaticText::new(description.0, description.1),
        category,
        risk,
    }
}

use TaskRisk::{Critical, High, Low, Medium};

static TASK_CATALOG: &[TaskDefinition] = &[
    def("requests.view", "requests", ("Voir les demandes", "View requests"), ("Consulter la liste des demandes", "View the list of requests"), Low),
    def("requests.create", "requests", ("Créer une demande", "Create a request"), ("Soumettre une nouvelle demande", "Submit a new request"), Low),
    def("requests.process", "requests", ("Traiter les demandes", "Process requests"), ("Instruire et traiter les demandes", "Process and handle requests"), Medium),
    def("requests.validate", "requests", ("Valider les demandes", "Validate requests"), ("Approuver ou rejeter les demandes", "Approve or reject requests"), High),
    def("requests.assign", "requests", ("Assigner les demandes", "Assign requests"), ("Attribuer les demandes à un agent", "Assign requests to an agent"), Medium),
    def("requests.delete", "requests", ("Supprimer les demandes", "Delete requests"), ("Supprimer définitivement une demande", "Permanently delete a request"), Critical),
    def("requests.complete", "requests", ("Clôturer les demandes", "Complete requests"), ("Marquer une demande comme terminée", "Mark a request as completed"), Medium),
    def("documents.view", "documents", ("Voir les documents", "View documents"), ("Consulter les documents", "View documents"), Low),
    def("documents.validate", "documents", ("Valider les documents", "Validate documents"), ("Vérifier et valider les documents", "Verify and validate documents"), High),
    def("documents.generate", "documents", ("Générer les documents", "Generate documents"), ("Générer des documents officiels", "Generate official documents"), High),
    def("documents.delete", "documents", ("Supprimer les documents", "Delete documents"), ("Supprimer définitivement un document", "Permanently delete a document"), Critical),
    def("appointments.view", "appointments", ("Voir les rendez-vous", "View appointments"), ("Consulter les rendez-vous", "View appointments"), Low),
    def("appointments.manage", "appointments", ("Gérer les rendez-vous", "Manage appointments"), ("Créer, modifier et annuler des rendez-vous", "Create, edit and cancel appointments"), Medium),
    def("appointments.configure", "appointments", ("Configurer les créneaux", "Configure slots"), ("Configurer les plages horaires disponibles", "Configure available time slots"), Medium),
    def("profiles.view", "profiles", ("Voir les profils", "View profiles"), ("Consulter les profils des usagers", "View user profiles"), Low),
    def("profiles.manage", "profiles", ("Gérer les profils", "Manage profiles"), ("Modifier les profils des usagers", "Edit user profiles"), High),
    def("civil_status.transcribe", "civil_status", ("Transcrire les actes", "Transcribe records"), ("Transcrire les actes d'état civil", "Transcribe civil status records"), High),
    def("civil_status.register", "civil_status", ("Enregistrer les actes", "Register records"), ("Enregistrer de nouveaux actes d'état civil", "Register new civil status records"), High),
    def("civil_status.certify", "civil_status", ("Certifier les actes", "Certify records"), ("Certifier la conformité des actes", "Certify record conformity"), High),
    def("passports.process", "passports", ("Traiter les passeports", "Process passports"), ("Instruire les demandes de passeport", "Process passport applications"), High),
    def("passports.biometric", "passports", ("Biométrie", "Biometrics"), ("Capturer les données biométriques", "Capture biometric data"), Medium),
    def("passports.deliver", "passports", ("Délivrer les passeports", "Deliver passports"), ("Remettre les passeports aux demandeurs", "Hand over passports to applicants"), High),
    def("visas.process", "visas", ("Traiter les visas", "Process visas"), ("Instruire les demandes de visa", "Process visa applications"), High),
    def("visas.approve", "visas", ("Approuver les visas", "Approve visas"), ("Approuver ou refuser les demandes de visa", "Approve or deny visa applications"), Critical),
    def("visas.stamp", "visas", ("Apposer le visa", "Stamp visa"), ("Apposer le visa sur le passeport", "Stamp the visa on the passport"), High),
    def("finance.view", "finance", ("Voir les finances", "View finances"), ("Consulter les informations financières", "View financial information"), Medium),
    def("finance.collect", "finance", ("Encaisser", "Collect payments"), ("Encaisser les droits et frais consulaires", "Collect consular fees and duties"), High),
    def("finance.manage", "finance", ("Gérer les finances", "Manage finances"), ("Gérer la comptabilité et les rapports financiers", "Manage accounting and financial reports"), Critical),
    def("communication.publish", "communication", ("Publier du contenu", "Publish content"), ("Publier des articles et actualités", "Publish articles and news"), Medium),
    def("communication.notify", "communication", ("Envoyer des notifications", "Send notifications"), ("Envoyer des notifications aux usagers", "Send notifications to users"), Medium),
    def("team.view", "team", ("Voir l'équipe", "View team"), ("Consulter les membres de l'équipe", "View team members"), Low),
    def("team.manage", "team", ("Gérer l'équipe", "Manage team"), ("Ajouter et retirer des membres", "Add and remove members"), High),
    def("team.assign_roles", "team", ("Attribuer les rôles", "Assign roles"), ("Attribuer des rôles et permissions", "Assign roles and permissions"), Critical),
    def("settings.view", "settings", ("Voir les paramètres", "View settings"), ("Consulter les paramètres du poste", "View post settings"), Low),
    def("settings.manage", "settings", ("Gérer les paramètres", "Manage settings"), ("Modifier les paramètres du poste", "Edit post settings"), High),
    def("analytics.view", "analytics", ("Voir les statistiques", "View analytics"), ("Consulter les tableaux de bord", "View dashboards"), Low),
    def("analytics.export", "analytics", ("Exporter les données", "Export data"), ("Exporter les rapports et données", "Export reports and data"), Medium),
    def("intelligence.view", "intelligence", ("Voir le renseignement", "View intelligence"), ("Consulter les notes de renseignement", "View intelligence notes"), Critical),
    def("intelligence.manage", "intelligence", ("Gérer le renseignement", "Manage intelligence"), ("Créer et gérer les notes de renseignement", "Create and manage intelligence notes"), Critical),
];

static TASK_CATEGORIES: &[TaskCategory] = &[
    TaskCategory { code: "requests", label: StaticText::new("Demandes", "Requests"), icon: "FileEdit" },
    TaskCategory { code: "documents", label: StaticText::new("Documents", "Documents"), icon: "FileText" },
    TaskCategory { code: "appointments", label: StaticText::new("Rendez-vous", "Appointments"), icon: "CalendarDays" },
    TaskCategory { code: "profiles", label: StaticText::new("Profils", "Profiles"), icon: "User" },
    TaskCategory { code: "civil_status", label: StaticText::new("État civil", "Civil status"), icon: "ScrollText" },
    TaskCategory { code: "passports", label: StaticText::new("Passeports", "Passports"), icon: "BookOpen" },
    TaskCategory { code: "visas", label: StaticText::new("Visas", "Visas"), icon: "Stamp" },
    TaskCategory { code: "finance", label: StaticText::new("Finances", "Finance"), icon: "Wallet" },
    TaskCategory { code: "communication", label: StaticText::new("Communication", "Communication"), icon: "Megaphone" },
    TaskCategory { code: "team", label: StaticText::new("Équipe", "Team"), icon: "Users" },
    TaskCategory { code: "settings", label: StaticText::new("Paramètres", "Settings"), icon: "Settings" },
    TaskCategory { code: "analytics", label: StaticText::new("Statistiques", "Analytics"), icon: "BarChart3" },
    TaskCategory { code: "intelligence", label: StaticText::new("Renseignement", "Intelligence"), icon: "ShieldAlert" },
];

pub fn list_tasks() -> &'static [TaskDefinition] {
    TASK_CATALOG
}

pub fn task(code: &str) -> Option<&'static TaskDefinition> {
    TASK_CATALOG.iter().find(|t| t.code == code)
}

pub fn task_category(code: &str) -> Option<&'static TaskCategory> {
    TASK_CATEGORIES.iter().find(|c| c.code == code)
}

/// Distinct categories in first-appearance order of the task catalog.
pub fn task_categories() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for t in TASK_CATALOG {
        if !out.contains(&t.category) {
            out.push(t.category);
        }
    }
    out
}

pub fn tasks_by_category() -> Vec<(&'static str, Vec<&'static TaskDefinition>)> {
    task_categories()
        .into_iter()
        .map(|c| (c, TASK_CATALOG.iter().filter(|t| t.category == c).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_codes_are_unique_and_prefixed_by_category() {
        let mut seen = std::collections::BTreeSet::new();
        for t in list_tasks() {
            assert!(seen.insert(t.code), "duplicate task code {}", t.code);
            assert!(t.code.starts_with(&format!("{}.", t.category)));
        }
    }

    #[test]
    fn categories_follow_first_appearance_and_all_have_metadata() {
        let cats = task_categories();
        assert_eq!(cats.first(), Some(&"requests"));
        assert_eq!(cats.last(), Some(&"intelligence"));
        assert_eq!(cats.len(), 13);
        for c in cats {
            assert!(task_category(c).is_some(), "missing metadata for {c}");
        }
    }

    #[test]
    fn tasks_by_category_partitions_the_catalog() {
        let grouped = tasks_by_category();
        let total: usize = grouped.iter().map(|(_, ts)| ts.len()).sum();
        assert_eq!(total, list_tasks().len());
        let (_, visas) = grouped.iter().find(|(c, _)| *c == "visas").unwrap();
        let codes: Vec<&str> = visas.iter().map(|t| t.code).collect();
        assert_eq!(codes, vec!["visas.process", "visas.approve", "visas.stamp"]);
    }

    #[test]
    fn risk_serializes_lowercase() {
        let t = task("intelligence.manage").unwrap();
        assert_eq!(t.risk, TaskRisk::Critical);
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json["risk"], "critical");
        assert_eq!(json["label"]["en"], "Manage intelligence");
    }
}
