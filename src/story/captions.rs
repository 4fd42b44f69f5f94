use imgui::Condition;

use crate::story::{scroll::CaptionAlign, state::StoryState};

const CAPTION_WIDTH: f32 = 420.0;
const MARGIN: f32 = 48.0;

/// Draws each on-screen section's caption where the section currently sits on the page.
pub fn draw_captions(state: &StoryState, ui: &imgui::Ui) {
    let [width, height] = ui.io().display_size;

    for (index, section) in state.config.sections.iter().enumerate() {
        let top = state.layout.section_top(index) - state.scroll;
        let section_height = state.layout.section_height(index);

        if top + section_height < 0.0 || top > height {
            continue;
        }

        let (x, pivot_x) = match section.align {
            CaptionAlign::Left => (MARGIN, 0.0),
            CaptionAlign::Center => (width * 0.5, 0.5),
            CaptionAlign::Right => (width - MARGIN, 1.0),
        };
        let y = top + section_height * 0.5;

        ui.window(format!("##caption-{}", section.class))
            .position([x, y], Condition::Always)
            .position_pivot([pivot_x, 0.5])
            .size([caption_width(width), 0.0], Condition::Always)
            .no_decoration()
            .no_inputs()
            .focus_on_appearing(false)
            .bg_alpha(0.55)
            .build(|| {
                ui.text_colored([1.0, 0.85, 0.4, 1.0], &section.title);
                ui.separator();
                ui.text_wrapped(&section.body);
            });
    }
}

fn caption_width(viewport_width: f32) -> f32 {
    CAPTION_WIDTH.min(viewport_width - 2.0 * MARGIN).max(0.0)
}

pub fn draw_debug_window(state: &StoryState, ui: &imgui::Ui) {
    ui.window("Debug")
        .position([16.0, 16.0], Condition::FirstUseEver)
        .size([360.0, 420.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("{:.1} fps", ui.io().framerate));
            ui.text(format!(
                "Scroll: {:.0} / {:.0}",
                state.scroll,
                state.layout.max_scroll()
            ));
            ui.text(format!(
                "Featured: {}",
                state
                    .choreographer
                    .featured_actor(state.triggers.active_count())
                    .name()
            ));
            ui.text(format!("Running tweens: {}", state.tweens.len()));
            ui.text(format!("Models loading: {}", state.pending_models()));

            if ui.collapsing_header("Triggers", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                for trigger in state.triggers.iter() {
                    ui.text(format!(
                        "{} at {:.0}: {}",
                        trigger.class,
                        trigger.offset(&state.layout),
                        if trigger.is_active() { "active" } else { "-" }
                    ));
                }
            }

            if ui.collapsing_header("Actors", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                for actor in crate::story::actor::Actor::ALL {
                    let actor_state = state.cast.get(actor);
                    let pose = actor_state.pose;
                    ui.text(format!(
                        "{}{}: pos ({:.1}, {:.1}, {:.1}) scale {:.2}",
                        if actor_state.visible { "* " } else { "  " },
                        actor.name(),
                        pose.position.x,
                        pose.position.y,
                        pose.position.z,
                        pose.scale.x
                    ));
                }
            }

            if ui.collapsing_header("Materials", imgui::TreeNodeFlags::empty()) {
                state.materials.draw_ui(ui);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_width_fits_the_viewport() {
        assert_eq!(caption_width(1280.0), CAPTION_WIDTH);
        assert_eq!(caption_width(400.0), 400.0 - 2.0 * MARGIN);
        assert_eq!(caption_width(60.0), 0.0);
    }
}
