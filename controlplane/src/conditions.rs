/*
Copyright 2025 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Condition lists keyed by condition type.

use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

use crate::traits::HasConditions;

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// An ordered collection holding at most one condition per type. New types
/// are appended; existing entries keep their position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conditions(Vec<metav1::Condition>);

impl Conditions {
    pub fn new(conditions: Vec<metav1::Condition>) -> Self {
        let mut merged = Self::default();
        for condition in conditions {
            merged.upsert(condition);
        }
        merged
    }

    /// Inserts or updates the condition of the same type.
    ///
    /// `last_transition_time` only moves when the status changes; a matching
    /// status keeps the stored timestamp and takes the new reason, message and
    /// observed generation. Returns true if anything changed.
    pub fn upsert(&mut self, new_cond: metav1::Condition) -> bool {
        let Some(existing) = self.0.iter_mut().find(|c| c.type_ == new_cond.type_) else {
            self.0.push(new_cond);
            return true;
        };

        if existing.status != new_cond.status {
            *existing = new_cond;
            return true;
        }

        let mut changed = false;
        if existing.reason != new_cond.reason {
            existing.reason = new_cond.reason;
            changed = true;
        }
        if existing.message != new_cond.message {
            existing.message = new_cond.message;
            changed = true;
        }
        if existing.observed_generation != new_cond.observed_generation {
            existing.observed_generation = new_cond.observed_generation;
            changed = true;
        }
        changed
    }

    pub fn into_vec(self) -> Vec<metav1::Condition> {
        self.0
    }
}

#[cfg(test)]
impl Conditions {
    pub fn get(&self, type_: &str) -> Option<&metav1::Condition> {
        self.0.iter().find(|c| c.type_ == type_)
    }

    pub fn iter(&self) -> impl Iterator<Item = &metav1::Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// Sets the provided condition on any object implementing HasConditions.
// See Conditions::upsert for the merge rules.
pub fn set_condition<T: HasConditions>(obj: &mut T, new_cond: metav1::Condition) -> bool {
    let slot = obj.get_conditions_mut();
    let mut conditions = Conditions::new(slot.take().unwrap_or_default());
    let changed = conditions.upsert(new_cond);
    *slot = Some(conditions.into_vec());
    changed
}
