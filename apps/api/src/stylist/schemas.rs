//! Response schemas declared to the model for each stylist call.

use crate::llm_client::schema::Schema;
use crate::stylist::models::BodyType;

pub fn diagnosis_schema() -> Schema {
    Schema::object()
        .required_property(
            "type",
            Schema::one_of(BodyType::ALL.iter().map(|t| t.as_str())),
        )
        .required_property("reason", Schema::string())
}

pub fn weather_schema() -> Schema {
    Schema::object()
        .required_property("city", Schema::string())
        .required_property("temp", Schema::number().describe("Degrees Celsius"))
        .required_property("condition", Schema::string())
        .required_property("humidity", Schema::number().describe("Percent"))
        .required_property("description", Schema::string())
}

pub fn outfit_schema() -> Schema {
    let item = Schema::object()
        .required_property("name", Schema::string())
        .optional_property("brandName", Schema::string())
        .required_property("description", Schema::string())
        .required_property("searchKeyword", Schema::string());

    Schema::object()
        .required_property("title", Schema::string())
        .required_property("items", Schema::array(item))
        .required_property("tips", Schema::string())
        .required_property("reason", Schema::string())
        .required_property("audioText", Schema::string())
}
