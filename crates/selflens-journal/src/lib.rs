use anyhow::{Context, Result};
use chrono::Utc;
use selflens_core::export::{self, JournalDocument};
use selflens_core::{
    compute_insights, Incident, IncidentDraft, IncidentFilter, IncidentId, Insights, Profile,
    SelfLensError, Theme, ViewState,
};
use selflens_store::{
    corrupt_key, KeyValueStore, ACCESS_CODE_KEY, AGREED_KEY, INCIDENTS_KEY, PROFILE_KEY,
    THEME_KEY,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

// ── Constants ──

pub const MIN_ACCESS_CODE_LEN: usize = 4;
const AGREED_VALUE: &str = "true";

// ── Types ──

/// An open journal: every record loaded once, every mutation written back
/// whole.
#[derive(Debug)]
pub struct Journal<S: KeyValueStore> {
    store: S,
    agreed: bool,
    profile: Profile,
    incidents: Vec<Incident>,
    theme: Theme,
    access_code: Option<String>,
    view: ViewState,
}

// ── Helpers ──

/// Read a record, treating bytes the store cannot decode as absent.
fn read_record<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<String>> {
    match store.get(key) {
        Ok(raw) => Ok(raw),
        Err(SelfLensError::Undecodable { .. }) => {
            log::warn!("record {} is unreadable, starting empty", key);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", key)),
    }
}

/// Keep a damaged record under its side key before a save replaces it.
fn preserve_corrupt<S: KeyValueStore>(store: &mut S, key: &str, raw: &str) -> Result<()> {
    let side = corrupt_key(key);
    store
        .set(&side, raw)
        .with_context(|| format!("saving {}", side))?;
    log::warn!("kept a copy of damaged record {} under {}", key, side);
    Ok(())
}

/// Parse a JSON record, treating a missing or malformed value as empty.
fn load_record<S, T>(store: &mut S, key: &str) -> Result<T>
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    let Some(raw) = read_record(store, key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::warn!("record {} is malformed, starting empty: {}", key, e);
            preserve_corrupt(store, key, &raw)?;
            Ok(T::default())
        }
    }
}

/// Load the incident list entry by entry. Entries that fail to parse are
/// skipped and the rest are kept.
fn load_incidents<S: KeyValueStore>(store: &mut S) -> Result<Vec<Incident>> {
    let Some(raw) = read_record(store, INCIDENTS_KEY)? else {
        return Ok(Vec::new());
    };
    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("incident list is malformed, starting empty: {}", e);
            preserve_corrupt(store, INCIDENTS_KEY, &raw)?;
            return Ok(Vec::new());
        }
    };

    let total = entries.len();
    let mut incidents = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Incident>(entry) {
            Ok(incident) => incidents.push(incident),
            Err(e) => log::warn!("skipping incident {} of {}: {}", index + 1, total, e),
        }
    }
    if incidents.len() < total {
        preserve_corrupt(store, INCIDENTS_KEY, &raw)?;
    }
    Ok(incidents)
}

/// Write a whole record as JSON.
fn save_json<S, T>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value).with_context(|| format!("serializing {}", key))?;
    store
        .set(key, &json)
        .with_context(|| format!("saving {}", key))?;
    Ok(())
}

fn parse_theme(raw: Option<String>) -> Theme {
    match raw.as_deref() {
        None | Some("dark") => Theme::Dark,
        Some("light") => Theme::Light,
        Some(other) => {
            log::warn!("unknown theme {:?}, using dark", other);
            Theme::Dark
        }
    }
}

// ── Public API ──

impl<S: KeyValueStore> Journal<S> {
    /// Load every record from the store.
    pub fn open(mut store: S) -> Result<Self> {
        let agreed = store
            .get(AGREED_KEY)
            .context("reading agreement flag")?
            .is_some_and(|v| !v.is_empty());
        let profile: Profile = load_record(&mut store, PROFILE_KEY)?;
        let incidents = load_incidents(&mut store)?;
        let theme = parse_theme(read_record(&store, THEME_KEY)?);
        let access_code = store
            .get(ACCESS_CODE_KEY)
            .context("reading access code")?
            .filter(|code| !code.is_empty());

        log::debug!("opened journal with {} incidents", incidents.len());

        Ok(Self {
            view: ViewState::initial(agreed, access_code.is_some()),
            store,
            agreed,
            profile,
            incidents,
            theme,
            access_code,
        })
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn has_agreed(&self) -> bool {
        self.agreed
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Incidents in display order, newest entry first.
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn has_access_code(&self) -> bool {
        self.access_code.is_some()
    }

    /// Record acceptance of the disclaimer.
    pub fn agree(&mut self) -> Result<()> {
        self.store
            .set(AGREED_KEY, AGREED_VALUE)
            .context("saving agreement flag")?;
        self.agreed = true;
        self.view.agree(self.access_code.is_some());
        Ok(())
    }

    /// Commit a draft to the head of the list.
    pub fn add_incident(&mut self, draft: IncidentDraft) -> Result<&Incident> {
        let incident = draft.into_incident(Utc::now());
        log::info!("adding incident {}", incident.id);
        self.incidents.insert(0, incident);
        self.save_incidents()?;
        Ok(&self.incidents[0])
    }

    /// Remove the incident with `id`. An unknown id leaves the list as it
    /// was. Returns whether an incident was removed.
    pub fn delete_incident(&mut self, id: IncidentId) -> Result<bool> {
        let before = self.incidents.len();
        self.incidents.retain(|incident| incident.id != id);
        let removed = self.incidents.len() != before;
        self.save_incidents()?;
        if removed {
            log::info!("deleted incident {}", id);
        }
        Ok(removed)
    }

    pub fn update_profile(&mut self, profile: Profile) -> Result<()> {
        self.profile = profile;
        save_json(&mut self.store, PROFILE_KEY, &self.profile)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        self.store
            .set(THEME_KEY, self.theme.as_str())
            .context("saving theme")?;
        Ok(self.theme)
    }

    /// Set the access code and lock the journal.
    pub fn set_access_code(&mut self, code: &str) -> Result<()> {
        if code.chars().count() < MIN_ACCESS_CODE_LEN {
            return Err(SelfLensError::AccessCodeTooShort {
                min: MIN_ACCESS_CODE_LEN,
            }
            .into());
        }
        self.store
            .set(ACCESS_CODE_KEY, code)
            .context("saving access code")?;
        self.access_code = Some(code.to_string());
        self.view.lock();
        Ok(())
    }

    /// Compare an attempt against the access code. A mismatch is rejected
    /// and can be retried freely.
    pub fn unlock(&mut self, attempt: &str) -> selflens_core::Result<()> {
        match &self.access_code {
            Some(code) if code != attempt => Err(SelfLensError::IncorrectAccessCode),
            _ => {
                self.view.unlock();
                Ok(())
            }
        }
    }

    pub fn remove_access_code(&mut self) -> Result<()> {
        self.store
            .remove(ACCESS_CODE_KEY)
            .context("removing access code")?;
        self.access_code = None;
        self.view.unlock();
        Ok(())
    }

    pub fn insights(&self) -> Option<Insights> {
        compute_insights(&self.incidents)
    }

    pub fn filtered(&self, filter: &IncidentFilter) -> Vec<&Incident> {
        filter.apply(&self.incidents)
    }

    /// Profile and incidents as one document.
    pub fn document(&self) -> JournalDocument {
        JournalDocument {
            profile: self.profile.clone(),
            incidents: self.incidents.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        export::to_json(&self.document()).context("serializing journal")
    }

    pub fn export_csv(&self) -> String {
        export::to_csv(&self.incidents)
    }

    /// Replace profile and incidents wholesale.
    pub fn replace_document(&mut self, document: JournalDocument) -> Result<()> {
        self.profile = document.profile;
        self.incidents = document.incidents;
        save_json(&mut self.store, PROFILE_KEY, &self.profile)?;
        self.save_incidents()?;
        log::info!("replaced journal, {} incidents", self.incidents.len());
        Ok(())
    }

    fn save_incidents(&mut self) -> Result<()> {
        save_json(&mut self.store, INCIDENTS_KEY, &self.incidents)
    }
}

// ── Tests ──
