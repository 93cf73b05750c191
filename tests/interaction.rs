use glam::Vec3;
use once_cell::sync::Lazy;

use glyphlight::{
    App, Controller, Font, KeyCode, MeshId, Preset, SceneDescription, SceneState,
};

static FONT: Lazy<Font> = Lazy::new(|| Font::builtin().expect("builtin font parses"));

fn app(preset: Preset) -> App {
    let description = preset.description();
    let state = SceneState::build(&description, &FONT).expect("scene builds");
    App::new(state, description.controls)
}

fn key(name: &str) -> KeyCode {
    KeyCode::from_name(name).expect("valid key name")
}

fn near(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn every_draw_sees_the_same_light_after_a_key_press() {
    let mut app = app(Preset::Metallic);
    for _ in 0..5 {
        app.handle_key(key("w"));
    }
    let frame = app.frame();
    let expected = Vec3::new(0.0, 1.5, 0.0);
    let glyphs = [MeshId::Glyph(0), MeshId::Glyph(1)];
    for mesh in glyphs {
        let item = frame.draw(mesh).expect("glyph is drawn");
        assert!(near(item.uniform.light_position(), expected));
    }
    let marker = frame.draw(MeshId::Marker).expect("marker is drawn");
    assert!(near(
        marker.uniform.model().transform_point3(Vec3::ZERO),
        expected
    ));
}

#[test]
fn opposite_keys_cancel_out() {
    let mut app = app(Preset::Specular);
    let light = app.state().light.position();
    let camera = app.state().camera.position;

    for name in ["w", "w", "a", "d", "s", "s"] {
        app.handle_key(key(name));
    }

    assert!(near(app.state().light.position(), light));
    assert!(near(app.state().camera.position, camera));
}

#[test]
fn raising_the_light_changes_top_face_shading() {
    let mut app = app(Preset::Diffuse);
    let top = |app: &App| {
        let state = app.state();
        let glyph = &state.glyphs[1];
        let bounds = glyph.geometry.bounds();
        let point = Vec3::new(bounds.center().x, bounds.max.y, bounds.center().z);
        glyph
            .uniform(state.features)
            .shade_local(state.camera.position, point, Vec3::Y)
            .color()
    };

    let before = top(&app);
    for _ in 0..20 {
        app.handle_key(key("w"));
    }
    let after = top(&app);
    assert_ne!(before, after);
}

#[test]
fn custom_step_and_bindings_from_xml() {
    let xml = r#"<scene preset="specular">
        <controls>
            <step>1</step>
            <camera-left>Left</camera-left>
            <camera-right>Right</camera-right>
        </controls>
    </scene>"#;
    let description = SceneDescription::from_xml(xml).expect("scene parses");
    let state = SceneState::build(&description, &FONT).expect("scene builds");
    let mut app = App::new(state, description.controls);

    assert!(app.handle_key(key("a")).is_none());
    app.handle_key(key("ArrowLeft"));
    app.handle_key(key("ArrowLeft"));
    app.handle_key(key("Right"));
    assert!(near(app.state().camera.position, Vec3::new(-1.0, 0.0, 5.0)));
    assert_eq!(app.controller().step, 1.0);
    assert_ne!(*app.controller(), Controller::default());
}
