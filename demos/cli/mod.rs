use std::env;
use std::process;

use archivelib::{Sdk, SdkConfig};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

/// Flag parser over the process arguments; whatever is not taken stays
/// positional.
pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let index = self.args.iter().position(|a| names.contains(&a.as_str()))?;
        if index + 1 >= self.args.len() {
            usage_and_exit(self.usage);
        }
        let value = self.args.remove(index + 1);
        self.args.remove(index);
        Some(value)
    }

    pub fn take_flag(&mut self, name: &str) -> bool {
        let before = self.args.len();
        self.args.retain(|a| a != name);
        self.args.len() != before
    }

    pub fn require(&mut self, names: &[&str]) -> String {
        self.take_value(names)
            .unwrap_or_else(|| usage_and_exit(self.usage))
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

/// Login settings shared by the demos.
pub struct Account {
    pub host: String,
    pub username: String,
    pub password: String,
    pub config: SdkConfig,
}

impl Account {
    pub fn from_parser(parser: &mut ArgParser) -> Self {
        let host = parser.require(&["--host"]);
        let username = parser.require(&["--username", "-u"]);
        let password = parser.require(&["--password", "-p"]);

        let mut config = match parser.take_value(&["--config"]) {
            Some(path) => SdkConfig::from_file(&path).unwrap_or_else(|e| {
                eprintln!("Failed to read {path}: {e}");
                process::exit(1);
            }),
            None => SdkConfig::default(),
        };
        if let Some(proxy) = parser.take_value(&["--proxy"]) {
            config = config.with_proxy(proxy);
        }

        Self {
            host,
            username,
            password,
            config,
        }
    }

    pub async fn login(&self) -> archivelib::Result<Sdk> {
        Sdk::from_local_account_with_config(
            &self.host,
            &self.username,
            &self.password,
            self.config.clone(),
        )
        .await
    }
}
