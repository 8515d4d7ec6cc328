//! Reference set generation.
//!
//! [`ReferenceGenerator`] is the only component that talks to the image
//! capability: it loads the record, asks the planner what to do, calls the
//! generator for every angle that is not skipped, writes the images and
//! rewrites the sidecar. It also renders one image per character sheet for
//! a whole data root.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use move37_core::catalog::{self, Category};
use move37_core::composer::compose_sheet;
use move37_core::error::CoreError;
use move37_core::migration::{merge_style_references, record_style_references};
use move37_core::naming::character_sheet_render_path;
use move37_core::planner::{
    effective_style, plan_character_references, plan_environment_references,
    CharacterPlanRequest, PlannedAngle, ReferencePlan,
};
use move37_core::records::{non_empty, CharacterRecord, EnvironmentRecord};
use move37_core::reference::AspectRatio;
use move37_core::store::DataStore;
use move37_core::style::resolve_style;
use move37_genai::{GenAiError, ImageGenerator, ImageRequest};

use crate::error::PipelineError;
use crate::throttle::ThrottlePolicy;

/// Paths produced for one angle: a bare path for single-image sets, a list
/// when variants were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReferencePaths {
    Single(String),
    Variants(Vec<String>),
}

impl ReferencePaths {
    fn from_paths(mut paths: Vec<String>, variant_count: u32) -> Self {
        if variant_count == 1 && paths.len() == 1 {
            Self::Single(paths.remove(0))
        } else {
            Self::Variants(paths)
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(path) => Value::String(path.clone()),
            Self::Variants(paths) => {
                Value::Array(paths.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Inputs for [`ReferenceGenerator::generate_character_references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterReferenceRequest {
    pub character_id: String,
    /// Style override; falls back to the record's `style_id`.
    pub style_id: Option<String>,
    /// Regenerate even when the files already exist.
    pub force: bool,
    /// Images per angle, at least 1.
    pub variant_count: u32,
    /// Restrict the run to a single angle.
    pub target_angle: Option<String>,
}

impl CharacterReferenceRequest {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            style_id: None,
            force: false,
            variant_count: 1,
            target_angle: None,
        }
    }

    fn plan_request(&self) -> CharacterPlanRequest<'_> {
        CharacterPlanRequest {
            character_id: &self.character_id,
            style_override: self.style_id.as_deref(),
            target_angle: self.target_angle.as_deref(),
            variant_count: self.variant_count,
            force: self.force,
        }
    }
}

/// One character sheet rendered by [`ReferenceGenerator::render_character_sheets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSheet {
    pub id: String,
    pub name: Option<String>,
    /// Path relative to the characters directory.
    pub path: String,
}

/// Executes reference plans against an image capability.
pub struct ReferenceGenerator {
    store: DataStore,
    images: Arc<dyn ImageGenerator>,
    throttle: ThrottlePolicy,
}

impl ReferenceGenerator {
    pub fn new(store: DataStore, images: Arc<dyn ImageGenerator>, throttle: ThrottlePolicy) -> Self {
        Self {
            store,
            images,
            throttle,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    // ---- characters ----

    /// Load the character and compute its plan without generating anything.
    pub fn plan_character(
        &self,
        request: &CharacterReferenceRequest,
    ) -> Result<(CharacterRecord, ReferencePlan), PipelineError> {
        let record = self.store.load_character(&request.character_id)?;
        let style_key = effective_style(&record, request.style_id.as_deref());
        let style = resolve_style(&self.store, Some(&style_key));

        let plan = plan_character_references(&record, &request.plan_request(), &style, |path| {
            self.store.exists(Category::Characters, path)
        })?;
        Ok((record, plan))
    }

    /// Generate a character's reference set and record it in the sidecar.
    ///
    /// Returns every planned angle, skipped ones included, mapped to its
    /// paths relative to the characters directory.
    pub async fn generate_character_references(
        &self,
        request: &CharacterReferenceRequest,
    ) -> Result<IndexMap<String, ReferencePaths>, PipelineError> {
        let (mut record, plan) = self.plan_character(request)?;
        let style_key = plan
            .effective_style
            .clone()
            .ok_or_else(|| CoreError::InvalidArgument("character plan has no style".into()))?;

        tracing::info!(
            character_id = %request.character_id,
            style = %style_key,
            planned = plan.angles.len(),
            skipped = plan.skipped().count(),
            variant_count = request.variant_count,
            force = request.force,
            "Generating character references"
        );

        self.execute(Category::Characters, &plan, non_empty(&record.negative_prompt))
            .await?;

        let result: IndexMap<String, ReferencePaths> = plan
            .angles
            .iter()
            .map(|angle| {
                (
                    angle.angle.clone(),
                    ReferencePaths::from_paths(angle.paths(), request.variant_count),
                )
            })
            .collect();

        let entries: Map<String, Value> = result
            .iter()
            .map(|(angle, paths)| (angle.clone(), paths.to_value()))
            .collect();
        if request.target_angle.is_some() {
            merge_style_references(&mut record, &style_key, entries);
        } else {
            record_style_references(&mut record, &style_key, Value::Object(entries));
        }
        self.store.save_character(&request.character_id, &record)?;

        tracing::info!(
            character_id = %request.character_id,
            style = %style_key,
            angles = result.len(),
            "Character references recorded"
        );
        Ok(result)
    }

    // ---- environments ----

    /// Load the environment and compute its plan without generating anything.
    pub fn plan_environment(
        &self,
        environment_id: &str,
        force: bool,
    ) -> Result<(EnvironmentRecord, ReferencePlan), PipelineError> {
        let record = self.store.load_environment(environment_id)?;
        let style = resolve_style(&self.store, non_empty(&record.style_id));
        let plan = plan_environment_references(&record, environment_id, &style, force, |path| {
            self.store.exists(Category::Environments, path)
        });
        Ok((record, plan))
    }

    /// Generate an environment's reference set and record it in the sidecar
    /// as a flat `angle -> path` map.
    pub async fn generate_environment_references(
        &self,
        environment_id: &str,
        force: bool,
    ) -> Result<IndexMap<String, String>, PipelineError> {
        let (mut record, plan) = self.plan_environment(environment_id, force)?;

        tracing::info!(
            environment_id,
            planned = plan.angles.len(),
            skipped = plan.skipped().count(),
            force,
            "Generating environment references"
        );

        self.execute(Category::Environments, &plan, non_empty(&record.negative_prompt))
            .await?;

        let result: IndexMap<String, String> = plan
            .angles
            .iter()
            .filter_map(|angle| {
                let path = angle.slots.first()?.relative_path.clone();
                Some((angle.angle.clone(), path))
            })
            .collect();

        record.reference_images = Some(Value::Object(
            result
                .iter()
                .map(|(angle, path)| (angle.clone(), Value::String(path.clone())))
                .collect(),
        ));
        self.store.save_environment(environment_id, &record)?;

        tracing::info!(environment_id, angles = result.len(), "Environment references recorded");
        Ok(result)
    }

    // ---- batch render ----

    /// Render one square image per character sheet under `characters/`,
    /// prompted by the composed sheet. Existing renders are overwritten.
    /// Stops at the first failure; images already written stay on disk.
    pub async fn render_character_sheets(&self) -> Result<Vec<RenderedSheet>, PipelineError> {
        let filenames = catalog::list_records(self.store.root(), Category::Characters.dir_name())?;
        tracing::info!(sheets = filenames.len(), "Rendering character sheets");

        let mut rendered = Vec::with_capacity(filenames.len());
        for (call_index, filename) in filenames.iter().enumerate() {
            let id = filename.trim_end_matches(".json");
            let record = self.store.load_character(id)?;

            if call_index > 0 {
                self.throttle.pause().await;
            }
            let request = ImageRequest {
                prompt: compose_sheet(&record, &self.store),
                count: 1,
                aspect_ratio: AspectRatio::Square,
                negative_prompt: non_empty(&record.negative_prompt).map(str::to_string),
            };
            let images = self
                .throttle
                .call_with_backoff(|| self.images.generate(&request))
                .await?;
            let Some(image) = images.into_iter().next() else {
                return Err(GenAiError::InvalidResponse(format!(
                    "no image returned for character sheet '{id}'"
                ))
                .into());
            };

            let relative = character_sheet_render_path(id);
            let path = self
                .store
                .write_image(Category::Characters, &relative, &image.bytes)?;
            tracing::info!(character_id = id, path = %path.display(), "Character sheet rendered");

            rendered.push(RenderedSheet {
                id: id.to_string(),
                name: record.display_name().map(str::to_string),
                path: relative,
            });
        }
        Ok(rendered)
    }

    // ---- execution ----

    /// Generate and write every non-skipped angle of `plan`, pausing between
    /// consecutive calls.
    async fn execute(
        &self,
        category: Category,
        plan: &ReferencePlan,
        negative_prompt: Option<&str>,
    ) -> Result<(), PipelineError> {
        for (call_index, angle) in plan.to_generate().enumerate() {
            if call_index > 0 {
                self.throttle.pause().await;
            }
            self.generate_angle(category, angle, negative_prompt).await?;
        }
        Ok(())
    }

    async fn generate_angle(
        &self,
        category: Category,
        angle: &PlannedAngle,
        negative_prompt: Option<&str>,
    ) -> Result<(), PipelineError> {
        let request = ImageRequest {
            prompt: angle.prompt.clone(),
            count: angle.slots.len() as u32,
            aspect_ratio: angle.aspect_ratio,
            negative_prompt: negative_prompt.map(str::to_string),
        };

        tracing::debug!(
            angle = %angle.angle,
            count = request.count,
            aspect_ratio = request.aspect_ratio.as_str(),
            "Requesting reference images"
        );
        let images = self
            .throttle
            .call_with_backoff(|| self.images.generate(&request))
            .await?;

        if images.len() < angle.slots.len() {
            return Err(GenAiError::InvalidResponse(format!(
                "requested {} images for angle '{}', received {}",
                angle.slots.len(),
                angle.angle,
                images.len()
            ))
            .into());
        }

        for (slot, image) in angle.slots.iter().zip(images) {
            let path = self
                .store
                .write_image(category, &slot.relative_path, &image.bytes)?;
            tracing::info!(angle = %slot.angle, path = %path.display(), "Reference image saved");
        }
        Ok(())
    }
}
