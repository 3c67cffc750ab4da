use crate::core::config::data::path_display;
use crate::core::templates::{TemplateError, TemplateStore};

pub fn list_templates(store: &TemplateStore) -> Result<(), TemplateError> {
    for line in template_list_lines(store)? {
        println!("{line}");
    }
    Ok(())
}

fn template_list_lines(store: &TemplateStore) -> Result<Vec<String>, TemplateError> {
    let names = store.list()?;
    let dir = path_display(store.dir());
    if names.is_empty() {
        return Ok(vec![format!("No templates in {dir}")]);
    }
    let mut lines = vec![format!("Templates in {dir}:")];
    lines.extend(names.into_iter().map(|name| format!("  {name}")));
    Ok(lines)
}
