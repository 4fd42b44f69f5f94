use crate::{
    rendering::renderer::Renderer,
    story::{
        captions::{draw_captions, draw_debug_window},
        state::StoryState,
    },
};

pub fn update(
    state: &mut StoryState,
    renderer: &mut Renderer,
    ui: &mut imgui::Ui,
    dt: f32,
) -> anyhow::Result<()> {
    state.scene.early_update();
    state.update(dt);
    renderer.upload_new_models(state);
    state.scene.late_update();

    draw_captions(state, ui);
    if state.show_debug {
        draw_debug_window(state, ui);
    }

    Ok(())
}
