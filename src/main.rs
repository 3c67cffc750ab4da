use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    casual_chat::cli::main()
}
