use super::Shell;
use crate::line::Command;
use anyhow::Result;

mod core;

pub type Builtin = fn(&mut Shell, &Command) -> Result<()>;

pub enum Module {
    Core,
}

pub fn load_module(smsh: &mut Shell, module: Module) {
    match module {
        Module::Core => {
            smsh.builtins.insert("cd", core::chdir);
            smsh.builtins.insert("exit", core::exit);
            smsh.builtins.insert("status", core::status);
        }
    }
}
