//! Reference set planning.
//!
//! Decides, for each reference angle, which image slots exist, where they
//! live on disk, and whether the angle must be (re)generated. Planning does
//! no I/O: the caller injects the existence check, so the same plan can be
//! used for dry runs.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::naming::{
    character_reference_dir, environment_reference_dir, reference_filename, variant_indices,
};
use crate::records::{non_empty, CharacterRecord, EnvironmentRecord};
use crate::reference::{
    character_reference_prompts, environment_aspect_ratio, environment_reference_prompts,
    AspectRatio, CHARACTER_ANGLES,
};
use crate::store::validate_record_id;
use crate::style::StyleRecord;

/// Style key used when neither an override nor the record names a style.
pub const DEFAULT_STYLE_KEY: &str = "default_style";

/// Most images the image backend returns for one prompt.
pub const MAX_VARIANT_COUNT: u32 = 4;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// One image file of a reference set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSlot {
    pub angle: String,
    /// `None` for single-image angles, `Some(1..)` for variants.
    pub variant_index: Option<u32>,
    /// Path relative to the category directory, `/`-separated.
    pub relative_path: String,
}

/// Everything known about one angle of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedAngle {
    pub angle: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub slots: Vec<ReferenceSlot>,
    /// `true` when every slot already exists and regeneration was not forced.
    pub skip: bool,
}

impl PlannedAngle {
    pub fn paths(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.relative_path.clone()).collect()
    }
}

/// The full reference plan for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePlan {
    /// Style key the images are filed under (`None` for environments).
    pub effective_style: Option<String>,
    /// Output directory relative to the category directory.
    pub output_dir: String,
    /// Angles in generation order.
    pub angles: Vec<PlannedAngle>,
}

impl ReferencePlan {
    /// Every angle's paths, including skipped angles.
    pub fn paths(&self) -> IndexMap<String, Vec<String>> {
        self.angles
            .iter()
            .map(|a| (a.angle.clone(), a.paths()))
            .collect()
    }

    /// Prompts of the angles that must be generated.
    pub fn prompts(&self) -> IndexMap<String, String> {
        self.to_generate()
            .map(|a| (a.angle.clone(), a.prompt.clone()))
            .collect()
    }

    pub fn to_generate(&self) -> impl Iterator<Item = &PlannedAngle> {
        self.angles.iter().filter(|a| !a.skip)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PlannedAngle> {
        self.angles.iter().filter(|a| a.skip)
    }
}

// ---------------------------------------------------------------------------
// Character planning
// ---------------------------------------------------------------------------

/// Inputs for a character plan.
#[derive(Debug, Clone, Copy)]
pub struct CharacterPlanRequest<'a> {
    pub character_id: &'a str,
    pub style_override: Option<&'a str>,
    pub target_angle: Option<&'a str>,
    pub variant_count: u32,
    pub force: bool,
}

/// Style key for a plan: override, then the record's `style_id`, then
/// [`DEFAULT_STYLE_KEY`]. Blank values count as absent.
pub fn effective_style(record: &CharacterRecord, style_override: Option<&str>) -> String {
    style_override
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| non_empty(&record.style_id))
        .unwrap_or(DEFAULT_STYLE_KEY)
        .to_string()
}

/// Validate a target angle against the known character angles.
pub fn validate_angle(angle: &str) -> Result<(), CoreError> {
    if CHARACTER_ANGLES.contains(&angle) {
        Ok(())
    } else {
        Err(CoreError::InvalidArgument(format!(
            "Unknown reference angle '{angle}'. Must be one of: {CHARACTER_ANGLES:?}"
        )))
    }
}

/// Validate a variant count: between 1 and [`MAX_VARIANT_COUNT`] images per angle.
pub fn validate_variant_count(variant_count: u32) -> Result<(), CoreError> {
    if !(1..=MAX_VARIANT_COUNT).contains(&variant_count) {
        return Err(CoreError::InvalidArgument(format!(
            "variant_count must be between 1 and {MAX_VARIANT_COUNT}, got {variant_count}"
        )));
    }
    Ok(())
}

/// Plan a character's reference set.
///
/// `style` is the resolved record for [`effective_style`]; `exists` answers
/// whether a relative path is already on disk.
pub fn plan_character_references(
    record: &CharacterRecord,
    request: &CharacterPlanRequest<'_>,
    style: &StyleRecord,
    exists: impl Fn(&str) -> bool,
) -> Result<ReferencePlan, CoreError> {
    validate_variant_count(request.variant_count)?;
    if let Some(angle) = request.target_angle {
        validate_angle(angle)?;
    }

    // Both end up as directory names under characters/.
    validate_record_id(request.character_id)?;
    let effective_style = effective_style(record, request.style_override);
    validate_record_id(&effective_style)?;
    let output_dir = character_reference_dir(request.character_id, &effective_style);
    let mut prompts = character_reference_prompts(record, request.character_id, style);
    if let Some(target) = request.target_angle {
        prompts.retain(|angle, _| angle == target);
    }

    let angles = prompts
        .into_iter()
        .map(|(angle, prompt)| {
            let slots: Vec<ReferenceSlot> = variant_indices(request.variant_count)
                .into_iter()
                .map(|index| ReferenceSlot {
                    relative_path: format!("{output_dir}/{}", reference_filename(&angle, index)),
                    variant_index: index,
                    angle: angle.clone(),
                })
                .collect();
            let skip = !request.force && slots.iter().all(|s| exists(&s.relative_path));
            PlannedAngle {
                angle,
                prompt,
                aspect_ratio: AspectRatio::Square,
                slots,
                skip,
            }
        })
        .collect();

    Ok(ReferencePlan {
        effective_style: Some(effective_style),
        output_dir,
        angles,
    })
}

// ---------------------------------------------------------------------------
// Environment planning
// ---------------------------------------------------------------------------

/// Plan an environment's reference set: one image per angle, flat layout.
pub fn plan_environment_references(
    record: &EnvironmentRecord,
    environment_id: &str,
    style: &StyleRecord,
    force: bool,
    exists: impl Fn(&str) -> bool,
) -> ReferencePlan {
    let output_dir = environment_reference_dir(environment_id);

    let angles = environment_reference_prompts(record, environment_id, style)
        .into_iter()
        .map(|(angle, prompt)| {
            let slot = ReferenceSlot {
                relative_path: format!("{output_dir}/{}", reference_filename(&angle, None)),
                variant_index: None,
                angle: angle.clone(),
            };
            let skip = !force && exists(&slot.relative_path);
            PlannedAngle {
                aspect_ratio: environment_aspect_ratio(&angle),
                angle,
                prompt,
                slots: vec![slot],
                skip,
            }
        })
        .collect();

    ReferencePlan {
        effective_style: None,
        output_dir,
        angles,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn record(style_id: Option<&str>) -> CharacterRecord {
        serde_json::from_value(json!({
            "name": "Kaelen",
            "physical_traits": {"hair": "silver"},
            "style_id": style_id
        }))
        .unwrap()
    }

    fn request(variant_count: u32, force: bool) -> CharacterPlanRequest<'static> {
        CharacterPlanRequest {
            character_id: "kaelen",
            style_override: None,
            target_angle: None,
            variant_count,
            force,
        }
    }

    fn nothing_exists(_: &str) -> bool {
        false
    }

    #[test]
    fn effective_style_precedence() {
        assert_eq!(effective_style(&record(Some("noir")), Some("ghibli")), "ghibli");
        assert_eq!(effective_style(&record(Some("noir")), None), "noir");
        assert_eq!(effective_style(&record(Some("noir")), Some(" ")), "noir");
        assert_eq!(effective_style(&record(None), None), "default_style");
        assert_eq!(effective_style(&record(Some("")), None), "default_style");
    }

    #[test]
    fn fresh_plan_generates_all_angles() {
        let plan = plan_character_references(
            &record(Some("noir")),
            &request(1, false),
            &StyleRecord::default(),
            nothing_exists,
        )
        .unwrap();

        assert_eq!(plan.effective_style.as_deref(), Some("noir"));
        assert_eq!(plan.output_dir, "kaelen_refs/noir");
        assert_eq!(plan.to_generate().count(), 4);
        assert_eq!(plan.paths()["front"], ["kaelen_refs/noir/front.jpg"]);
        assert_eq!(plan.prompts().len(), 4);
    }

    #[test]
    fn variants_are_numbered() {
        let plan = plan_character_references(
            &record(None),
            &request(3, false),
            &StyleRecord::default(),
            nothing_exists,
        )
        .unwrap();

        assert_eq!(
            plan.paths()["front"],
            [
                "kaelen_refs/default_style/front_1.jpg",
                "kaelen_refs/default_style/front_2.jpg",
                "kaelen_refs/default_style/front_3.jpg",
            ]
        );
        let indices: Vec<_> = plan.angles[0].slots.iter().map(|s| s.variant_index).collect();
        assert_eq!(indices, [Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn existing_angles_are_skipped_but_keep_paths() {
        let existing: HashSet<&str> = ["kaelen_refs/noir/front.jpg", "kaelen_refs/noir/back.jpg"]
            .into_iter()
            .collect();

        let plan = plan_character_references(
            &record(Some("noir")),
            &request(1, false),
            &StyleRecord::default(),
            |path| existing.contains(path),
        )
        .unwrap();

        let skipped: Vec<_> = plan.skipped().map(|a| a.angle.as_str()).collect();
        assert_eq!(skipped, ["front", "back"]);
        let generate: Vec<_> = plan.prompts().keys().cloned().collect();
        assert_eq!(generate, ["side", "head"]);
        assert_eq!(plan.paths().len(), 4);
        assert_eq!(plan.paths()["back"], ["kaelen_refs/noir/back.jpg"]);
    }

    #[test]
    fn partial_variants_are_regenerated() {
        // Only one of three variants exists: the angle is not complete.
        let plan = plan_character_references(
            &record(Some("noir")),
            &request(3, false),
            &StyleRecord::default(),
            |path| path == "kaelen_refs/noir/front_1.jpg",
        )
        .unwrap();
        assert_eq!(plan.to_generate().count(), 4);
    }

    #[test]
    fn force_generates_everything() {
        let plan = plan_character_references(
            &record(Some("noir")),
            &request(1, true),
            &StyleRecord::default(),
            |_| true,
        )
        .unwrap();
        assert_eq!(plan.to_generate().count(), 4);
        assert_eq!(plan.skipped().count(), 0);
    }

    #[test]
    fn planning_is_idempotent() {
        let exists = |path: &str| path.ends_with("side.jpg");
        let first = plan_character_references(
            &record(Some("noir")),
            &request(1, false),
            &StyleRecord::default(),
            exists,
        )
        .unwrap();
        let second = plan_character_references(
            &record(Some("noir")),
            &request(1, false),
            &StyleRecord::default(),
            exists,
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn target_angle_restricts_plan() {
        let mut req = request(1, false);
        req.target_angle = Some("head");
        let plan =
            plan_character_references(&record(None), &req, &StyleRecord::default(), nothing_exists)
                .unwrap();
        let angles: Vec<_> = plan.angles.iter().map(|a| a.angle.as_str()).collect();
        assert_eq!(angles, ["head"]);
    }

    #[test]
    fn unknown_target_angle_is_invalid() {
        let mut req = request(1, false);
        req.target_angle = Some("left_eyebrow");
        let result =
            plan_character_references(&record(None), &req, &StyleRecord::default(), nothing_exists);
        assert_matches!(result, Err(CoreError::InvalidArgument(msg)) if msg.contains("left_eyebrow"));
    }

    #[test]
    fn zero_variants_is_invalid() {
        let result = plan_character_references(
            &record(None),
            &request(0, false),
            &StyleRecord::default(),
            nothing_exists,
        );
        assert_matches!(result, Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn variant_count_is_capped() {
        let plan = plan_character_references(
            &record(None),
            &request(MAX_VARIANT_COUNT, false),
            &StyleRecord::default(),
            nothing_exists,
        )
        .unwrap();
        assert_eq!(plan.angles[0].slots.len(), MAX_VARIANT_COUNT as usize);

        let result = plan_character_references(
            &record(None),
            &request(200_000, false),
            &StyleRecord::default(),
            nothing_exists,
        );
        assert_matches!(result, Err(CoreError::InvalidArgument(msg)) if msg.contains("200000"));
    }

    #[test]
    fn traversal_style_override_is_invalid() {
        let mut req = request(1, false);
        req.style_override = Some("../../../escaped");
        let result =
            plan_character_references(&record(None), &req, &StyleRecord::default(), nothing_exists);
        assert_matches!(result, Err(CoreError::InvalidArgument(msg)) if msg.contains("escaped"));
    }

    #[test]
    fn traversal_record_style_is_invalid() {
        let result = plan_character_references(
            &record(Some("noir/../../x")),
            &request(1, false),
            &StyleRecord::default(),
            nothing_exists,
        );
        assert_matches!(result, Err(CoreError::InvalidArgument(_)));
    }

    #[test]
    fn environment_plan_is_flat() {
        let environment: EnvironmentRecord =
            serde_json::from_value(json!({"location_name": "Neon Alley"})).unwrap();
        let plan = plan_environment_references(
            &environment,
            "neon_alley",
            &StyleRecord::default(),
            false,
            |path| path == "neon_alley_refs/detail.jpg",
        );

        assert_eq!(plan.effective_style, None);
        assert_eq!(plan.paths()["establishing"], ["neon_alley_refs/establishing.jpg"]);
        assert_eq!(plan.angles[0].aspect_ratio, AspectRatio::Widescreen);
        let skipped: Vec<_> = plan.skipped().map(|a| a.angle.as_str()).collect();
        assert_eq!(skipped, ["detail"]);
    }
}
