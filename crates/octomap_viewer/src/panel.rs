//! egui settings and status window for the octomap display.
//!
//! Mirrors the display's configuration surface: every widget calls the
//! matching controller setter, which ignores unchanged values.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use octomap_bevy::{CloudEntities, OctomapCloud};
use octomap_cloud::StatusLevel;

use crate::scene::MapPublisher;

/// Frames offered in the fixed frame selector.
pub const FIXED_FRAMES: [&str; 2] = ["map", "odom"];

/// Plugin for the octomap window.
pub struct OctomapPanelPlugin;

impl Plugin for OctomapPanelPlugin {
  fn build(&self, app: &mut App) {
    app
      .init_resource::<TopicDraft>()
      .add_systems(EguiPrimaryContextPass, render_octomap_panel);
  }
}

/// Topic text being edited; applied on Enter.
#[derive(Resource, Default)]
struct TopicDraft(Option<String>);

fn status_color(level: StatusLevel) -> egui::Color32 {
  match level {
    StatusLevel::Ok => egui::Color32::LIGHT_GREEN,
    StatusLevel::Warn => egui::Color32::YELLOW,
    StatusLevel::Error => egui::Color32::LIGHT_RED,
  }
}

fn render_octomap_panel(
  mut contexts: EguiContexts,
  mut cloud: ResMut<OctomapCloud>,
  mut draft: ResMut<TopicDraft>,
  entities: Res<CloudEntities>,
  publisher: Option<Res<MapPublisher>>,
) {
  let Ok(ctx) = contexts.ctx_mut() else {
    return;
  };

  egui::Window::new("Octomap")
    .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
    .resizable(false)
    .show(ctx, |ui| {
      ui.set_min_width(240.0);

      let mut enabled = cloud.is_enabled();
      if ui.checkbox(&mut enabled, "Enabled").changed() {
        if enabled {
          cloud.on_enable();
        } else {
          cloud.on_disable();
        }
      }

      // Topic
      let topic = draft
        .0
        .get_or_insert_with(|| cloud.config().topic.clone());
      let response = ui
        .horizontal(|ui| {
          ui.label("Topic");
          ui.text_edit_singleline(topic)
        })
        .inner;
      if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        let topic = topic.clone();
        cloud.set_topic(topic);
      }

      let mut queue_size = cloud.config().queue_size;
      if ui
        .add(egui::Slider::new(&mut queue_size, 1..=50).text("Queue size"))
        .changed()
      {
        cloud.set_queue_size(queue_size);
      }

      let mut max_depth = cloud.config().max_tree_depth as u32;
      if ui
        .add(egui::Slider::new(&mut max_depth, 0..=15).text("Max depth"))
        .changed()
      {
        cloud.set_max_tree_depth(max_depth);
      }

      let mut color_factor = cloud.config().color_factor;
      if ui
        .add(egui::Slider::new(&mut color_factor, 0.0..=1.0).text("Color factor"))
        .changed()
      {
        cloud.set_color_factor(color_factor);
      }

      let mut fixed_frame = cloud.config().fixed_frame.clone();
      egui::ComboBox::from_label("Fixed frame")
        .selected_text(fixed_frame.as_str())
        .show_ui(ui, |ui| {
          for frame in FIXED_FRAMES {
            ui.selectable_value(&mut fixed_frame, frame.to_string(), frame);
          }
        });
      if fixed_frame != cloud.config().fixed_frame {
        cloud.fixed_frame_changed(fixed_frame);
      }

      if ui.button("Reset").clicked() {
        cloud.reset();
      }

      // Status
      ui.separator();
      for (name, entry) in cloud.status().iter() {
        ui.horizontal(|ui| {
          ui.colored_label(status_color(entry.level), name);
          ui.label(&entry.message);
        });
      }

      // Counters
      ui.separator();
      let stats = cloud.stats();
      egui::Grid::new("octomap_stats").show(ui, |ui| {
        let rows = [
          ("Decoded", stats.decoded.to_string()),
          ("Dropped (queue full)", stats.dropped_overflow.to_string()),
          ("Discarded (stale)", stats.discarded_stale.to_string()),
          ("Errors", (stats.decode_errors + stats.transform_errors).to_string()),
          ("Last decode", format!("{:.2} ms", stats.last_decode_us as f64 / 1000.0)),
          ("Avg decode", format!("{:.2} ms", stats.avg_decode_us / 1000.0)),
          (
            "Decode range",
            format!(
              "{:.2} - {:.2} ms",
              stats.min_decode_us as f64 / 1000.0,
              stats.max_decode_us as f64 / 1000.0
            ),
          ),
          ("Clouds", entities.len().to_string()),
        ];
        for (label, value) in rows {
          ui.label(label);
          ui.label(value);
          ui.end_row();
        }
        if let Some(publisher) = &publisher {
          ui.label("Published");
          ui.label(publisher.published().to_string());
          ui.end_row();
        }
      });
    });
}
