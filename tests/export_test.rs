use std::f64::consts::FRAC_PI_2;

use cgmath::{Matrix4, Rad};
use flow_export::{
    ExportSettings, Resolution, Scene, export_scene, export_to_file,
    data_structures::{
        material::{ShaderNode, ShadingGroup},
        mesh::{Face, PolygonMesh},
        scene_graph::{Attribute, CameraShape, LightShape, Node, NodeId, NodePayload},
    },
};

mod common;
use common::test_utils::{
    add_lambert, assign, blocks, cube_mesh, cube_scene, export_string, mesh_node, translated,
};
use tempfile::tempdir;

fn add_under(scene: &mut Scene, parent: Node, shape: Node) -> (NodeId, NodeId) {
    let parent = scene.add_root(parent);
    let shape = scene.add_node(shape);
    scene.add_child(parent, shape);
    (parent, shape)
}

fn camera(shape: CameraShape) -> Node {
    Node::new("cameraShape", NodePayload::Camera(shape))
}

fn light(name: &str, shape: LightShape) -> Node {
    Node::new(name, NodePayload::Light(shape))
}

fn value_of<'a>(block: &'a str, key: &str) -> &'a str {
    block
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(key))
        .map(str::trim)
        .unwrap_or_else(|| panic!("no {} in {}", key, block))
}

#[test]
fn cube_is_written_with_its_world_transform_and_shader() {
    let (scene, _, _) = cube_scene();

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert!(out.starts_with("image {\n\tresolution 640 480\n\taa 0 2\n\tfilter gaussian\n}\n\n"));
    assert!(out.contains(
        "shader {\n\tname default\n\ttype diffuse\n\tdiff { \"sRGB nonlinear\" 0.7 0.7 0.7 }\n}\n"
    ));
    assert!(out.contains(
        "shader {\n\tname red\n\ttype diffuse\n\tdiff { \"sRGB nonlinear\" 1 0 0 }\n}\n"
    ));

    let objects = blocks(&out, "object");
    assert_eq!(objects.len(), 1);
    let object = objects[0];
    assert!(object.contains("\tshader red\n"));
    assert!(object.contains("\ttransform col 1 0 0 0 0 1 0 0 0 0 1 0 1 2 3 1\n"));
    assert!(object.contains("\ttype generic-mesh\n"));
    assert!(object.contains("\tname \"|pCube1|pCube1Shape\"\n"));
    assert!(object.contains("\tpoints 8\n\t\t-1 -1 -1\n"));
    assert!(object.contains("\ttriangles 12\n\t\t0 3 2\n\t\t0 2 1\n"));
    assert!(object.contains("\tnormals facevarying\n\t\t0 0 -1 0 0 -1 0 0 -1\n"));
    assert!(object.contains("\tuvs facevarying\n\t\t0 0 1 0 1 1\n"));
    assert!(!object.contains("face_shaders"));

    assert_eq!(stats.meshes, 1);
    assert_eq!(stats.materials, 1);
    assert_eq!(stats.instances, 0);
}

#[test]
fn unshaded_cube_with_a_camera() {
    let mut mesh = cube_mesh();
    mesh.uv_sets.clear();
    let mut scene = Scene::new();
    add_under(&mut scene, Node::transform("cube"), mesh_node("cubeShape", mesh));
    add_under(
        &mut scene,
        translated("persp", 0.0, 0.0, 10.0),
        camera(CameraShape::default()),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert_eq!(blocks(&out, "image").len(), 1);
    assert_eq!(blocks(&out, "shader").len(), 1);
    assert_eq!(blocks(&out, "camera").len(), 1);
    let objects = blocks(&out, "object");
    assert_eq!(objects.len(), 1);
    let object = objects[0];
    assert!(object.contains("	shader default
"));
    assert!(object.contains("	transform col 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
"));
    assert!(object.contains("	points 8
"));
    assert!(object.contains("	triangles 12
"));
    assert!(object.contains("	uvs none
"));
    assert_eq!(stats.materials, 0);
}

#[test]
fn shaders_come_before_any_geometry() {
    let (scene, _, _) = cube_scene();

    let (out, _) = export_string(&scene, &ExportSettings::default());

    let last_shader = out.rfind("shader {").unwrap();
    let first_object = out.find("object {").unwrap();
    assert!(last_shader < first_object);
}

#[test]
fn materials_shared_by_name_are_written_once() {
    let (mut scene, _, _) = cube_scene();
    let (_, other) = add_under(
        &mut scene,
        translated("pCube2", -1.0, 0.0, 0.0),
        mesh_node("pCube2Shape", cube_mesh()),
    );
    let shader = scene.add_shader(ShaderNode::lambert("red", [1.0, 0.0, 0.0], 1.0));
    let group = scene.add_shading_group(ShadingGroup {
        name: "otherRedSG".to_string(),
        surface_shaders: vec![shader],
    });
    assign(&mut scene, other, 0, vec![group], Vec::new());

    let (out, _) = export_string(&scene, &ExportSettings::default());

    let red: Vec<&str> = blocks(&out, "shader")
        .into_iter()
        .filter(|block| block.contains("\tname red\n"))
        .collect();
    assert_eq!(red.len(), 1);
    assert!(out.find("\tname red\n").unwrap() < out.find("object {").unwrap());
    let objects = blocks(&out, "object");
    assert_eq!(objects.len(), 2);
    assert!(objects.iter().all(|o| o.contains("\tshader red\n")));
}

#[test]
fn multi_material_meshes_list_shaders_and_face_indices() {
    let (mut scene, _, shape) = cube_scene();
    // the cube's own group
    let red = 0;
    let blue = add_lambert(&mut scene, "blue", [0.0, 0.0, 1.0]);
    assign(&mut scene, shape, 0, vec![red, blue], vec![0, 0, 0, 1, 1, 1]);

    let (out, _) = export_string(&scene, &ExportSettings::default());

    let object = blocks(&out, "object")[0];
    assert!(object.contains("\tshaders 2\n\t\tred\n\t\tblue\n"));
    let face_shaders: Vec<&str> = object
        .split("\tface_shaders\n")
        .nth(1)
        .unwrap()
        .lines()
        .take_while(|line| *line != "}")
        .map(str::trim)
        .collect();
    assert_eq!(
        face_shaders,
        vec!["0", "0", "0", "0", "0", "0", "1", "1", "1", "1", "1", "1"]
    );
}

#[test]
fn exporting_twice_gives_the_same_text() {
    let (mut scene, _, _) = cube_scene();
    let (_, shape) = add_under(
        &mut scene,
        translated("pCube2", -4.0, 0.0, 0.0),
        mesh_node("pCube2Shape", cube_mesh()),
    );
    let blue = add_lambert(&mut scene, "blue", [0.0, 0.0, 1.0]);
    assign(&mut scene, shape, 0, vec![blue], Vec::new());
    let settings = ExportSettings::default();

    let (first, _) = export_string(&scene, &settings);
    let (second, _) = export_string(&scene, &settings);

    assert_eq!(first, second);
}

#[test]
fn hidden_and_intermediate_meshes_are_skipped() {
    let (mut scene, transform, _) = cube_scene();
    scene.set_attribute(transform, Attribute::Visibility, false);
    let (_, history) = add_under(
        &mut scene,
        translated("pCube2", 0.0, 0.0, 0.0),
        mesh_node("pCube2ShapeOrig", cube_mesh()),
    );
    scene.set_attribute(history, Attribute::Intermediate, true);

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert!(blocks(&out, "object").is_empty());
    assert_eq!(stats.meshes, 0);
    assert_eq!(stats.skipped, 2);
}

#[test]
fn empty_meshes_are_skipped() {
    let mut scene = Scene::new();
    add_under(
        &mut scene,
        translated("empty", 0.0, 0.0, 0.0),
        mesh_node("emptyShape", PolygonMesh::default()),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert!(blocks(&out, "object").is_empty());
    assert_eq!(stats.skipped, 1);
}

#[test]
fn broken_triangulation_fails_the_export() {
    let mut mesh = cube_mesh();
    mesh.faces[0] = Face {
        triangles: vec![[0, 3, 5]],
        ..mesh.faces[0].clone()
    };
    let mut scene = Scene::new();
    add_under(&mut scene, translated("bad", 0.0, 0.0, 0.0), mesh_node("badShape", mesh));

    let err = export_scene(&scene, &ExportSettings::default(), Vec::new()).unwrap_err();

    assert!(format!("{:#}", err).contains("|bad|badShape"), "{:#}", err);
}

#[test]
fn cameras_look_down_their_negative_z_axis() {
    let mut scene = Scene::new();
    scene.resolution = Some(Resolution::new(200, 100));
    add_under(
        &mut scene,
        translated("camera1", 0.0, 0.0, 5.0),
        camera(CameraShape {
            orthographic: false,
            horizontal_fov: Rad(FRAC_PI_2),
        }),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    let cameras = blocks(&out, "camera");
    assert_eq!(cameras.len(), 1);
    let block = cameras[0];
    assert!(block.starts_with("% |camera1|cameraShape\ncamera {\n\ttype   pinhole\n"));
    assert_eq!(value_of(block, "eye"), "0 0 5");
    assert_eq!(value_of(block, "target"), "0 0 4");
    assert_eq!(value_of(block, "up"), "0 1 0");
    assert_eq!(value_of(block, "aspect"), "2");
    let fov: f64 = value_of(block, "fov").parse().unwrap();
    assert!((fov - 90.0).abs() < 1e-9);
    assert_eq!(stats.cameras, 1);
}

#[test]
fn orthographic_and_non_renderable_cameras_are_skipped() {
    let mut scene = Scene::new();
    add_under(
        &mut scene,
        translated("top", 0.0, 10.0, 0.0),
        camera(CameraShape {
            orthographic: true,
            ..Default::default()
        }),
    );
    let (_, persp) = add_under(
        &mut scene,
        translated("persp", 0.0, 0.0, 10.0),
        camera(CameraShape::default()),
    );
    scene.set_attribute(persp, Attribute::Renderable, false);

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert!(blocks(&out, "camera").is_empty());
    assert_eq!(stats.skipped, 2);
}

#[test]
fn only_the_first_directional_light_becomes_the_sun() {
    let mut scene = Scene::new();
    add_under(
        &mut scene,
        translated("sun1", 0.0, 0.0, 0.0),
        light("sunShape1", LightShape::Directional { shadow_samples: 8 }),
    );
    add_under(
        &mut scene,
        translated("sun2", 0.0, 0.0, 0.0),
        light("sunShape2", LightShape::Directional { shadow_samples: 4 }),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    let lights = blocks(&out, "light");
    assert_eq!(lights.len(), 1);
    assert!(lights[0].contains("\ttype sunsky\n\tup 0 1 0\n\teast 0 0 1\n\tsundir 0 0 1\n"));
    assert!(lights[0].contains("\tturbidity 2\n\tsamples 8\n"));
    assert_eq!(stats.lights, 1);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn sun_direction_follows_the_light_rotation() {
    let mut scene = Scene::new();
    // +Z rotated a quarter turn about X points down -Y
    let tilt = Matrix4::from_cols(
        [1.0, 0.0, 0.0, 0.0].into(),
        [0.0, 0.0, 1.0, 0.0].into(),
        [0.0, -1.0, 0.0, 0.0].into(),
        [0.0, 0.0, 0.0, 1.0].into(),
    );
    add_under(
        &mut scene,
        Node::transform("sun").with_local(tilt),
        light("sunShape", LightShape::Directional { shadow_samples: 16 }),
    );

    let (out, _) = export_string(&scene, &ExportSettings::default());

    assert!(blocks(&out, "light")[0].contains("\tsundir 0 -1 0\n"));
}

#[test]
fn area_lights_become_mesh_lights() {
    let mut scene = Scene::new();
    add_under(
        &mut scene,
        translated("area1", 0.0, 5.0, 0.0),
        light(
            "areaShape1",
            LightShape::Area {
                color: [1.0, 1.0, 1.0],
                intensity: 10.0,
                shadow_samples: 16,
            },
        ),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    let lights = blocks(&out, "light");
    assert_eq!(lights.len(), 1);
    assert_eq!(
        lights[0],
        "light {\n\ttype meshlight\n\tname |area1|areaShape1\n\temit { \"sRGB nonlinear\" 1 1 1 }\n\
         \tradiance 10\n\tsamples 16\n\tpoints 4\n\t\t-1 6 0\n\t\t1 6 0\n\t\t1 4 0\n\t\t-1 4 0\n\
         \ttriangles 2\n\t\t0 1 2\n\t\t0 2 3\n}"
    );
    assert_eq!(stats.lights, 1);
}

#[test]
fn hidden_and_unsupported_lights_are_skipped() {
    let mut scene = Scene::new();
    let (hidden, _) = add_under(
        &mut scene,
        translated("sun", 0.0, 0.0, 0.0),
        light("sunShape", LightShape::Directional { shadow_samples: 16 }),
    );
    scene.set_attribute(hidden, Attribute::Visibility, false);
    add_under(
        &mut scene,
        translated("bulb", 0.0, 0.0, 0.0),
        light(
            "bulbShape",
            LightShape::Other {
                type_name: "pointLight".to_string(),
            },
        ),
    );

    let (out, stats) = export_string(&scene, &ExportSettings::default());

    assert!(blocks(&out, "light").is_empty());
    assert_eq!(stats.lights, 0);
    assert_eq!(stats.skipped, 2);
}

#[test]
fn settings_resolution_overrides_the_host() {
    let mut scene = Scene::new();
    scene.resolution = Some(Resolution::new(1920, 1080));

    let (host, _) = export_string(&scene, &ExportSettings::default());
    let settings = ExportSettings {
        resolution: Some(Resolution::new(320, 240)),
        ..Default::default()
    };
    let (overridden, _) = export_string(&scene, &settings);

    assert!(host.contains("\tresolution 1920 1080\n"));
    assert!(overridden.contains("\tresolution 320 240\n"));
}

#[test]
fn invalid_settings_are_rejected_before_writing() {
    let (scene, _, _) = cube_scene();
    let settings = ExportSettings {
        filter: "bilinear".to_string(),
        ..Default::default()
    };
    let mut out = Vec::new();

    assert!(export_scene(&scene, &settings, &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn export_to_file_writes_the_same_text() {
    let (scene, _, _) = cube_scene();
    let settings = ExportSettings::default();
    let dir = tempdir().unwrap();
    let path = dir.path().join("cube.sc");

    let stats = export_to_file(&scene, &settings, &path).unwrap();

    let (expected, _) = export_string(&scene, &settings);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(stats.meshes, 1);
}

#[test]
fn unwritable_paths_are_reported() {
    let (scene, _, _) = cube_scene();
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("cube.sc");

    let err = export_to_file(&scene, &ExportSettings::default(), &path).unwrap_err();

    assert!(err.to_string().contains("Cannot write scene file"));
}
