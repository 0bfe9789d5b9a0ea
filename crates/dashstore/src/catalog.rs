//! # Dashboard Collections
//!
//! The dashboard persists three collections. Each has its own write policy,
//! which request handlers pass to the store with every `create`:
//!
//! | Collection | Ids | New documents | Written as |
//! |------------|-----|---------------|------------|
//! | `dashboard-stats` | numeric if created one by one (defaults carry none) | tail | whole array |
//! | `rebels-ranking` | numeric, `max + 1` | tail | per document |
//! | `notifications` | caller-supplied strings | head (most recent first) | per document |
//!
//! [`bootstrap`] is the explicit initialization step: it reads every collection
//! with its default so that missing files are created up front rather than on
//! whichever request happens to arrive first.

use serde_json::{json, Value};

use crate::backup::{BackupManager, BackupReport};
use crate::error::Result;
use crate::model::{CreateOptions, Document, IdKind, Placement};
use crate::store::{CollectionStore, StorageBackend};

pub struct CollectionDef {
    pub name: &'static str,
    pub id_kind: IdKind,
    pub placement: Placement,
    defaults: fn() -> Value,
}

impl CollectionDef {
    pub fn create_options(&self) -> CreateOptions {
        CreateOptions {
            id_kind: self.id_kind,
            placement: self.placement,
        }
    }

    pub fn default_documents(&self) -> Vec<Document> {
        match (self.defaults)() {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| Document::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub const DASHBOARD_STATS: CollectionDef = CollectionDef {
    name: "dashboard-stats",
    id_kind: IdKind::Numeric,
    placement: Placement::Tail,
    defaults: default_dashboard_stats,
};

pub const REBELS_RANKING: CollectionDef = CollectionDef {
    name: "rebels-ranking",
    id_kind: IdKind::Numeric,
    placement: Placement::Tail,
    defaults: default_rebels,
};

pub const NOTIFICATIONS: CollectionDef = CollectionDef {
    name: "notifications",
    id_kind: IdKind::Text,
    placement: Placement::Head,
    defaults: default_notifications,
};

pub const ALL: [&CollectionDef; 3] = [&DASHBOARD_STATS, &REBELS_RANKING, &NOTIFICATIONS];

pub fn find(name: &str) -> Option<&'static CollectionDef> {
    ALL.iter().copied().find(|def| def.name == name)
}

/// The collections a dashboard backup covers.
pub fn backup_set() -> Vec<&'static str> {
    ALL.iter().map(|def| def.name).collect()
}

/// Create every missing dashboard collection with its default content.
/// Existing collections are left as they are.
pub fn bootstrap<B: StorageBackend>(store: &CollectionStore<B>) -> Result<()> {
    store.ensure_ready()?;
    for def in ALL {
        store.read(def.name, &def.default_documents())?;
    }
    Ok(())
}

/// Back up the dashboard collections.
pub fn backup_dashboard<B: StorageBackend>(manager: &BackupManager<B>) -> Result<BackupReport> {
    manager.create_backup(backup_set().as_slice())
}

fn default_dashboard_stats() -> Value {
    json!([
        {
            "label": "ISSUES COMPLETED",
            "value": "49%",
            "description": "WEEKLY SCOPE",
            "intent": "positive",
            "icon": "gear",
            "direction": "up"
        },
        {
            "label": "MINUTES LOST",
            "value": "642'",
            "description": "IN MEETINGS AND RABBIT HOLES",
            "intent": "negative",
            "icon": "proccesor",
            "direction": "down"
        },
        {
            "label": "ACCIDENTS",
            "value": "0",
            "description": "THE CLIENT ALWAYS IS RIGHT",
            "intent": "neutral",
            "icon": "boom",
            "tag": "4 weeks 🔥"
        }
    ])
}

fn default_rebels() -> Value {
    json!([
        {
            "id": 1,
            "name": "KRIMSON",
            "handle": "@KRIMSON",
            "streak": "2 WEEKS STREAK 🔥",
            "points": 148,
            "avatar": "/avatars/user_krimson.png",
            "featured": true,
            "subtitle": "2 WEEKS STREAK 🔥"
        },
        {
            "id": 2,
            "name": "MATI",
            "handle": "@MATI",
            "streak": "",
            "points": 129,
            "avatar": "/avatars/user_mati.png"
        },
        {
            "id": 3,
            "name": "PEK",
            "handle": "@MATT",
            "streak": "",
            "points": 108,
            "avatar": "/avatars/user_pek.png"
        },
        {
            "id": 4,
            "name": "JOYBOY",
            "handle": "@JOYBOY",
            "streak": "",
            "points": 64,
            "avatar": "/avatars/user_joyboy.png"
        }
    ])
}

fn default_notifications() -> Value {
    json!([
        {
            "id": "notif-1",
            "title": "PAYMENT RECEIVED",
            "message": "Your payment to Rampant Studio has been processed successfully.",
            "timestamp": "2024-07-10T13:39:00Z",
            "type": "success",
            "read": false,
            "priority": "medium"
        },
        {
            "id": "notif-2",
            "title": "INTRO: JOYCO STUDIO AND V0",
            "message": "About us - We're a healthcare company focused on accessibility and innovation.",
            "timestamp": "2024-07-10T13:35:00Z",
            "type": "info",
            "read": false,
            "priority": "low"
        }
    ])
}
