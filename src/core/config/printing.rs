use crate::core::config::data::ChatConfig;

impl ChatConfig {
    pub fn print_models(&self) {
        println!("Configured models:");
        for (index, (name, model)) in self.models.iter().enumerate() {
            let marker = if index == 0 { " (default)" } else { "" };
            println!(
                "  {name}{marker}: {} via {} at {}",
                model.model,
                model.provider.as_str(),
                model.endpoint()
            );
        }
        if self.servers.is_empty() {
            println!("MCP servers: (none configured)");
        } else {
            println!("MCP servers:");
            for (name, server) in &self.servers {
                match (&server.command, &server.url) {
                    (Some(command), _) if server.is_stdio() => {
                        println!("  {name}: {command} {}", server.args.join(" "))
                    }
                    (_, Some(url)) => println!("  {name}: {url} (unsupported transport)"),
                    _ => println!("  {name}: (no command)"),
                }
            }
        }
    }
}
