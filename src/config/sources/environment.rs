//! Environment source: `MEALPLAN_<SECTION>__<KEY>`, e.g. `MEALPLAN_GENERATION__MAX_TOKENS=2048`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "MEALPLAN";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("batch.default_meal_types"),
    )
}
