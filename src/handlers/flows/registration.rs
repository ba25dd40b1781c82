//! Registration flow
//!
//! Asks for a name and an age, then thanks the user. Replying `cancel` at any
//! step ends the flow.
//!
//! State keys: `name` (written by `name`), `age` (written by `age`).

use crate::state::{Scene, SceneContext, SceneManager};
use crate::utils::errors::Result;

pub const NAME_SCENE: &str = "name";
pub const AGE_SCENE: &str = "age";

const CANCEL: &str = "cancel";

/// Build the (unverified) registration flow
pub fn registration_flow() -> SceneManager {
    SceneManager::new()
        .add_scene(Scene::from_fn(NAME_SCENE, "What's your name?", on_name))
        .add_scene(Scene::from_fn(AGE_SCENE, "How old are you?", on_age))
}

fn on_name(reply: &str, ctx: &mut SceneContext<'_>) -> Result<()> {
    let name = reply.trim();
    if name.eq_ignore_ascii_case(CANCEL) {
        ctx.finish_with("Registration cancelled.");
        return Ok(());
    }

    ctx.state_mut().set("name", name)?;
    ctx.next(AGE_SCENE);
    Ok(())
}

fn on_age(reply: &str, ctx: &mut SceneContext<'_>) -> Result<()> {
    let reply = reply.trim();
    if reply.eq_ignore_ascii_case(CANCEL) {
        ctx.finish_with("Registration cancelled.");
        return Ok(());
    }

    let Ok(age) = reply.parse::<u32>() else {
        ctx.reply("Please enter your age as a number.");
        return Ok(());
    };

    ctx.state_mut().set("age", age)?;
    let name: String = ctx.state().require("name")?;
    ctx.finish_with(format!("Thanks {}, you are registered ({} years).", name, age));
    Ok(())
}
