//! Form type registry
//!
//! Each form type has its own collection, its own record count and therefore
//! its own revision sequence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::revision::RevisionLabel;

/// Key holding the revision label
pub const REVISION_KEY: &str = "revisionNo";

/// Header object some form types nest their revision label under
pub const DOCUMENT_INFO_KEY: &str = "documentInfo";

/// Where a form type keeps its revision label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevisionField {
    /// `revisionNo`
    TopLevel,
    /// `documentInfo.revisionNo`
    DocumentInfo,
}

impl RevisionField {
    /// Dotted path, as shown to clients
    pub fn path(&self) -> &'static str {
        match self {
            RevisionField::TopLevel => "revisionNo",
            RevisionField::DocumentInfo => "documentInfo.revisionNo",
        }
    }

    /// Stored label, if the field is present (of any JSON type)
    pub fn read<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        match self {
            RevisionField::TopLevel => document.get(REVISION_KEY),
            RevisionField::DocumentInfo => document
                .get(DOCUMENT_INFO_KEY)
                .and_then(|info| info.get(REVISION_KEY)),
        }
    }

    /// Set the label. `document` must be an object; a missing or non-object
    /// `documentInfo` is replaced by an object.
    pub fn write(&self, document: &mut Value, label: &RevisionLabel) {
        let Some(root) = document.as_object_mut() else {
            return;
        };
        let target = match self {
            RevisionField::TopLevel => root,
            RevisionField::DocumentInfo => {
                let info = root
                    .entry(DOCUMENT_INFO_KEY)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !info.is_object() {
                    *info = Value::Object(Map::new());
                }
                match info.as_object_mut() {
                    Some(info) => info,
                    None => return,
                }
            }
        };
        target.insert(REVISION_KEY.to_string(), Value::String(label.to_string()));
    }

    /// Drop a client-supplied label
    pub fn remove(&self, document: &mut Value) {
        match self {
            RevisionField::TopLevel => {
                if let Some(root) = document.as_object_mut() {
                    root.remove(REVISION_KEY);
                }
            }
            RevisionField::DocumentInfo => {
                if let Some(info) = document
                    .get_mut(DOCUMENT_INFO_KEY)
                    .and_then(Value::as_object_mut)
                {
                    info.remove(REVISION_KEY);
                }
            }
        }
    }
}

/// The registered form types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    // Ship-to-ship transfer
    StsChecklist,
    StsDeclaration,
    StsQuestionnaire,
    StsHoseLog,
    StsMooringLog,
    // Equipment
    EquipmentInventory,
    EquipmentBaseStock,
    EquipmentMaintenanceLog,
    // QHSE
    QhseAudit,
    QhseIncidentReport,
    QhseDrillRecord,
    RiskAssessment,
    PermitToWork,
    ToolboxTalk,
    // Procurement
    VendorApproval,
    VendorEvaluation,
    Quotation,
    PurchaseOrder,
    // Crew and finance
    ExpenseSheet,
    CrewTimesheet,
}

impl FormKind {
    const ALL: [FormKind; 20] = [
        FormKind::StsChecklist,
        FormKind::StsDeclaration,
        FormKind::StsQuestionnaire,
        FormKind::StsHoseLog,
        FormKind::StsMooringLog,
        FormKind::EquipmentInventory,
        FormKind::EquipmentBaseStock,
        FormKind::EquipmentMaintenanceLog,
        FormKind::QhseAudit,
        FormKind::QhseIncidentReport,
        FormKind::QhseDrillRecord,
        FormKind::RiskAssessment,
        FormKind::PermitToWork,
        FormKind::ToolboxTalk,
        FormKind::VendorApproval,
        FormKind::VendorEvaluation,
        FormKind::Quotation,
        FormKind::PurchaseOrder,
        FormKind::ExpenseSheet,
        FormKind::CrewTimesheet,
    ];

    pub fn all() -> &'static [FormKind] {
        &Self::ALL
    }

    pub fn from_slug(slug: &str) -> Option<FormKind> {
        Self::ALL.iter().copied().find(|kind| kind.slug() == slug)
    }

    /// URL segment and upload directory name
    pub fn slug(&self) -> &'static str {
        match self {
            FormKind::StsChecklist => "sts-checklist",
            FormKind::StsDeclaration => "sts-declaration",
            FormKind::StsQuestionnaire => "sts-questionnaire",
            FormKind::StsHoseLog => "sts-hose-log",
            FormKind::StsMooringLog => "sts-mooring-log",
            FormKind::EquipmentInventory => "equipment-inventory",
            FormKind::EquipmentBaseStock => "equipment-base-stock",
            FormKind::EquipmentMaintenanceLog => "equipment-maintenance-log",
            FormKind::QhseAudit => "qhse-audit",
            FormKind::QhseIncidentReport => "qhse-incident-report",
            FormKind::QhseDrillRecord => "qhse-drill-record",
            FormKind::RiskAssessment => "risk-assessment",
            FormKind::PermitToWork => "permit-to-work",
            FormKind::ToolboxTalk => "toolbox-talk",
            FormKind::VendorApproval => "vendor-approval",
            FormKind::VendorEvaluation => "vendor-evaluation",
            FormKind::Quotation => "quotation",
            FormKind::PurchaseOrder => "purchase-order",
            FormKind::ExpenseSheet => "expense-sheet",
            FormKind::CrewTimesheet => "crew-timesheet",
        }
    }

    /// Storage collection
    pub fn collection(&self) -> &'static str {
        match self {
            FormKind::StsChecklist => "sts_checklists",
            FormKind::StsDeclaration => "sts_declarations",
            FormKind::StsQuestionnaire => "sts_questionnaires",
            FormKind::StsHoseLog => "sts_hose_logs",
            FormKind::StsMooringLog => "sts_mooring_logs",
            FormKind::EquipmentInventory => "equipment_inventories",
            FormKind::EquipmentBaseStock => "equipment_base_stocks",
            FormKind::EquipmentMaintenanceLog => "equipment_maintenance_logs",
            FormKind::QhseAudit => "qhse_audits",
            FormKind::QhseIncidentReport => "qhse_incident_reports",
            FormKind::QhseDrillRecord => "qhse_drill_records",
            FormKind::RiskAssessment => "risk_assessments",
            FormKind::PermitToWork => "permits_to_work",
            FormKind::ToolboxTalk => "toolbox_talks",
            FormKind::VendorApproval => "vendor_approvals",
            FormKind::VendorEvaluation => "vendor_evaluations",
            FormKind::Quotation => "quotations",
            FormKind::PurchaseOrder => "purchase_orders",
            FormKind::ExpenseSheet => "expense_sheets",
            FormKind::CrewTimesheet => "crew_timesheets",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormKind::StsChecklist => "STS Transfer Checklist",
            FormKind::StsDeclaration => "STS Declaration of Inspection",
            FormKind::StsQuestionnaire => "STS Pre-Transfer Questionnaire",
            FormKind::StsHoseLog => "STS Hose Log",
            FormKind::StsMooringLog => "STS Mooring Log",
            FormKind::EquipmentInventory => "Equipment Inventory",
            FormKind::EquipmentBaseStock => "Equipment Base Stock",
            FormKind::EquipmentMaintenanceLog => "Equipment Maintenance Log",
            FormKind::QhseAudit => "QHSE Audit",
            FormKind::QhseIncidentReport => "QHSE Incident Report",
            FormKind::QhseDrillRecord => "QHSE Drill Record",
            FormKind::RiskAssessment => "Risk Assessment",
            FormKind::PermitToWork => "Permit to Work",
            FormKind::ToolboxTalk => "Toolbox Talk",
            FormKind::VendorApproval => "Vendor Approval",
            FormKind::VendorEvaluation => "Vendor Evaluation",
            FormKind::Quotation => "Quotation",
            FormKind::PurchaseOrder => "Purchase Order",
            FormKind::ExpenseSheet => "Expense Sheet",
            FormKind::CrewTimesheet => "Crew Timesheet",
        }
    }

    /// STS paperwork carries a document-info header; everything else keeps
    /// the label at the top level.
    pub fn revision_field(&self) -> RevisionField {
        match self {
            FormKind::StsChecklist
            | FormKind::StsDeclaration
            | FormKind::StsQuestionnaire
            | FormKind::StsHoseLog
            | FormKind::StsMooringLog => RevisionField::DocumentInfo,
            _ => RevisionField::TopLevel,
        }
    }

    /// Document field holding the public path of the attached file, for
    /// form types that accept one
    pub fn upload_field(&self) -> Option<&'static str> {
        match self {
            FormKind::StsChecklist => Some("attachment"),
            FormKind::StsDeclaration => Some("signedDeclaration"),
            FormKind::EquipmentInventory => Some("photo"),
            FormKind::EquipmentBaseStock => Some("stockSheet"),
            FormKind::QhseAudit => Some("auditReport"),
            FormKind::QhseIncidentReport => Some("evidence"),
            FormKind::PermitToWork => Some("signedPermit"),
            FormKind::VendorApproval => Some("certificate"),
            FormKind::Quotation => Some("quotationFile"),
            FormKind::PurchaseOrder => Some("poDocument"),
            FormKind::ExpenseSheet => Some("receipt"),
            _ => None,
        }
    }

    pub fn info(&self) -> FormKindInfo {
        FormKindInfo {
            slug: self.slug(),
            title: self.title(),
            collection: self.collection(),
            revision_field: self.revision_field().path(),
            upload_field: self.upload_field(),
        }
    }
}

/// Registry entry as listed to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormKindInfo {
    pub slug: &'static str,
    pub title: &'static str,
    pub collection: &'static str,
    pub revision_field: &'static str,
    pub upload_field: Option<&'static str>,
}
