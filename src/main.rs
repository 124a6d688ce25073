use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_social_clean::SocialCleanPlugin;

fn main() {
    serve_plugin(&SocialCleanPlugin::default(), MsgPackSerializer {})
}
