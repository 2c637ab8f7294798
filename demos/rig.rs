//! Rig metanode demo: a rig and its components wired through
//! node-reference attributes, then checked by the manager.
//!
//! Run with: cargo run --example rig

use metanode::{
    AttrDef, AttrDefault, AttrSchema, AttrType, AttrValue, MetaConfig, MetaManager, MetaSpec,
    Metanode, Scene, register,
};

// Attribute keys
const A_COMPONENTS: &str = "rigComponents";
const A_RIG: &str = "rig";
const A_BUILT: &str = "isBuilt";
const A_START_JOINT: &str = "startJoint";
const A_END_JOINT: &str = "endJoint";
const A_CONTROLS: &str = "controls";
const A_BIND: &str = "bindJoints";

const RIG_DEFS: &[AttrDef] = &[AttrDef::new(A_COMPONENTS, AttrType::NodeList, 0)];
static RIG_SCHEMA: AttrSchema = AttrSchema::new("Rig", RIG_DEFS);

struct Rig;
impl MetaSpec for Rig {
    const META_TYPE: &'static str = "demo.Rig";

    fn schema() -> &'static AttrSchema {
        &RIG_SCHEMA
    }
}

const FK_DEFS: &[AttrDef] = &[
    AttrDef::new(A_RIG, AttrType::Node, 0),
    AttrDef::new(A_BUILT, AttrType::Bool, 0).with_default(AttrDefault::Bool(false)),
    AttrDef::new(A_START_JOINT, AttrType::Node, 0),
    AttrDef::new(A_END_JOINT, AttrType::Node, 0),
    AttrDef::new(A_CONTROLS, AttrType::NodeList, 0),
    AttrDef::new(A_BIND, AttrType::NodeList, 0),
];
static FK_SCHEMA: AttrSchema = AttrSchema::new("FkComponent", FK_DEFS);

struct FkComponent;
impl MetaSpec for FkComponent {
    const META_TYPE: &'static str = "demo.FkComponent";

    fn schema() -> &'static AttrSchema {
        &FK_SCHEMA
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    register::<Rig>();
    register::<FkComponent>();

    let mut scene = Scene::new();

    let rig = Metanode::<Rig>::create(&mut scene, "hero_rig")?;
    let spine = Metanode::<FkComponent>::create(&mut scene, "spine_fk")?;
    let tail = Metanode::<FkComponent>::create(&mut scene, "tail_fk")?;

    // Cross-link rig and components.
    let components = vec![spine.node(), tail.node()];
    rig.set(&mut scene, A_COMPONENTS, AttrValue::NodeList(components))?;
    for component in [spine, tail] {
        component.set(&mut scene, A_RIG, AttrValue::Node(Some(rig.node())))?;
    }
    spine.set(&mut scene, A_BUILT, AttrValue::Bool(true))?;

    println!("rig '{}' components:", rig.name(&scene)?);
    for uuid in rig.linked(&scene, A_COMPONENTS)? {
        let component = Metanode::<FkComponent>::wrap(&scene, uuid)?;
        println!(
            "  {:<12} built={}",
            component.name(&scene)?,
            component.get_bool(&scene, A_BUILT)?
        );
    }

    let mut manager = MetaManager::new(MetaConfig::new());
    manager.validate(&scene);
    println!("manager issues: {}", manager.issue_count());

    println!("{}", scene.to_json()?);
    Ok(())
}
