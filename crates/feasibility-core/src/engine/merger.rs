//! Effect merging.
//!
//! Merge semantics per field:
//!
//! | field | semantics |
//! |---|---|
//! | `techProfileId`, `techProfile` | shallow merge, later keys win |
//! | `roleIds`, `roles` | insert/overwrite role entries |
//! | `warnings`, `avoidTech`, `successFactors` | append, no dedup |
//! | `feasibility` | shallow merge of risk/confidence/summary |
//! | `eta.addMin` / `eta.addMax` | add to the running bounds |
//! | `eta_multiplier` | multiply the running bounds, rounding up |
//! | `scope_title`, `summary` | last writer wins |
//!
//! ETA ordering: within one effects object the additive adjustment is
//! applied first, then the multiplier. The multiplier is folded into the
//! running bounds immediately, so later additive effects are not scaled by
//! earlier multipliers. Bounds are clamped (`min >= 1`, `max >= min`) only
//! when the accumulator is finished.

use indexmap::IndexMap;

use crate::catalog::Catalog;
use crate::config::Baseline;
use crate::types::{
    AssessmentResult, Effects, EtaRange, Feasibility, RoleDescriptor, TechProfile,
};

/// Role and technology tables that `roleIds` / `techProfileId` resolve against.
#[derive(Debug, Clone, Copy)]
pub struct LookupTables<'a> {
    pub roles: &'a IndexMap<String, RoleDescriptor>,
    pub technologies: &'a IndexMap<String, TechProfile>,
}

impl<'a> LookupTables<'a> {
    pub fn new(
        roles: &'a IndexMap<String, RoleDescriptor>,
        technologies: &'a IndexMap<String, TechProfile>,
    ) -> Self {
        Self {
            roles,
            technologies,
        }
    }
}

impl<'a> From<&'a Catalog> for LookupTables<'a> {
    fn from(catalog: &'a Catalog) -> Self {
        Self::new(&catalog.roles, &catalog.technologies)
    }
}

/// The in-progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAccumulator {
    pub summary: String,
    pub tech_profile: TechProfile,
    pub roles: IndexMap<String, RoleDescriptor>,
    pub eta_min: i64,
    pub eta_max: i64,
    pub feasibility: Feasibility,
    pub warnings: Vec<String>,
    pub avoid_tech: Vec<String>,
    pub success_factors: Vec<String>,
    pub scope_title: String,
}

impl ResultAccumulator {
    /// Start from the configured baseline.
    pub fn from_baseline(baseline: &Baseline) -> Self {
        Self {
            summary: baseline.summary.clone(),
            tech_profile: TechProfile::new(),
            roles: IndexMap::new(),
            eta_min: i64::from(baseline.eta_min),
            eta_max: i64::from(baseline.eta_max),
            feasibility: Feasibility {
                risk: baseline.risk.clone(),
                confidence: baseline.confidence.clone(),
                summary: None,
            },
            warnings: Vec::new(),
            avoid_tech: Vec::new(),
            success_factors: Vec::new(),
            scope_title: baseline.scope_title.clone(),
        }
    }

    /// Clamp the timeline and produce the final result.
    pub fn finish(self) -> AssessmentResult {
        let min = self.eta_min.clamp(1, i64::from(u32::MAX));
        let max = self.eta_max.clamp(min, i64::from(u32::MAX));

        AssessmentResult {
            summary: Some(self.summary),
            tech_profile: self.tech_profile,
            roles: self.roles,
            eta: Some(EtaRange {
                min: min as u32,
                max: max as u32,
            }),
            feasibility: Some(self.feasibility),
            warnings: self.warnings,
            avoid_tech: self.avoid_tech,
            success_factors: self.success_factors,
            scope_title: Some(self.scope_title),
            ..Default::default()
        }
    }
}

impl Default for ResultAccumulator {
    fn default() -> Self {
        Self::from_baseline(&Baseline::default())
    }
}

/// Folds effects objects into a [`ResultAccumulator`].
#[derive(Debug, Clone, Copy)]
pub struct EffectMerger<'a> {
    tables: LookupTables<'a>,
}

impl<'a> EffectMerger<'a> {
    pub fn new(tables: impl Into<LookupTables<'a>>) -> Self {
        Self {
            tables: tables.into(),
        }
    }

    /// Merge one effects object into `acc`.
    ///
    /// Missing lookup ids are skipped; nothing here can fail.
    pub fn merge(&self, acc: &mut ResultAccumulator, effects: &Effects) {
        self.merge_tech_profile(acc, effects);
        self.merge_roles(acc, effects);
        merge_eta(acc, effects);

        if let Some(patch) = &effects.feasibility {
            if let Some(risk) = &patch.risk {
                acc.feasibility.risk = risk.clone();
            }
            if let Some(confidence) = &patch.confidence {
                acc.feasibility.confidence = confidence.clone();
            }
            if let Some(summary) = &patch.summary {
                acc.feasibility.summary = Some(summary.clone());
            }
        }

        if let Some(title) = &effects.scope_title {
            acc.scope_title = title.clone();
        }
        if let Some(summary) = &effects.summary {
            acc.summary = summary.clone();
        }

        if let Some(warnings) = &effects.warnings {
            acc.warnings.extend(warnings.iter().cloned());
        }
        if let Some(avoid) = &effects.avoid_tech {
            acc.avoid_tech.extend(avoid.iter().cloned());
        }
        if let Some(factors) = &effects.success_factors {
            acc.success_factors.extend(factors.iter().cloned());
        }
    }

    fn merge_tech_profile(&self, acc: &mut ResultAccumulator, effects: &Effects) {
        // Referenced profile first so inline fields can refine it.
        if let Some(id) = &effects.tech_profile_id {
            match self.tables.technologies.get(id) {
                Some(profile) => shallow_merge(&mut acc.tech_profile, profile),
                None => tracing::debug!(tech_profile_id = %id, "Unknown technology id skipped"),
            }
        }
        if let Some(profile) = &effects.tech_profile {
            shallow_merge(&mut acc.tech_profile, profile);
        }
    }

    fn merge_roles(&self, acc: &mut ResultAccumulator, effects: &Effects) {
        if let Some(ids) = &effects.role_ids {
            for id in ids {
                match self.tables.roles.get(id) {
                    Some(role) => {
                        acc.roles.insert(id.clone(), role.clone());
                    }
                    None => tracing::debug!(role_id = %id, "Unknown role id skipped"),
                }
            }
        }
        if let Some(roles) = &effects.roles {
            for (id, role) in roles {
                acc.roles.insert(id.clone(), role.clone());
            }
        }
    }
}

fn shallow_merge(target: &mut TechProfile, source: &TechProfile) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

fn merge_eta(acc: &mut ResultAccumulator, effects: &Effects) {
    if let Some(eta) = &effects.eta {
        acc.eta_min = acc.eta_min.saturating_add(eta.add_min.unwrap_or(0));
        acc.eta_max = acc.eta_max.saturating_add(eta.add_max.unwrap_or(0));
    }

    if let Some(multiplier) = effects.eta_multiplier {
        if multiplier.is_finite() && multiplier > 0.0 {
            acc.eta_min = scale_up(acc.eta_min, multiplier);
            acc.eta_max = scale_up(acc.eta_max, multiplier);
        } else {
            tracing::warn!(multiplier, "Ignoring non-positive ETA multiplier");
        }
    }
}

fn scale_up(months: i64, multiplier: f64) -> i64 {
    (months as f64 * multiplier).ceil() as i64
}
