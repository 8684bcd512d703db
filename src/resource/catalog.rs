//! Built-in collections of the admin console

use super::{AssetSlot, FieldSpec, ResourceDescriptor};
use crate::codec::{CompositeField, FlatteningCodec};
use crate::validation::{Email, MaxLength, MinLength, NumericRange, Pattern};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

lazy_static! {
    static ref USERNAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern is valid");
    static ref PHONE_REGEX: Regex =
        Regex::new(r"^(\+84|84|0)?[1-9]\d{8,9}$").expect("phone pattern is valid");
}

pub const INGREDIENTS: &str = "ingredients";
pub const ROLES: &str = "roles";
pub const USERS: &str = "users";
pub const MENUS: &str = "menus";
pub const CATEGORIES: &str = "categories";

pub fn ingredients() -> ResourceDescriptor {
    ResourceDescriptor::new(INGREDIENTS, "Ingredient")
        .field(
            FieldSpec::text("name", "Ingredient Name")
                .required("Please input the ingredient name!")
                .rule(MinLength::new(2, "Name must be at least 2 characters long")),
        )
        .column("name", "Name")
}

pub fn roles() -> ResourceDescriptor {
    ResourceDescriptor::new(ROLES, "Role")
        .field(FieldSpec::text("name", "Role Name").required("Please input the role name!"))
        .column("name", "Name")
}

pub fn users() -> ResourceDescriptor {
    ResourceDescriptor::new(USERS, "User")
        .codec(FlatteningCodec::new().default_value("isActive", json!(true)))
        .field(
            FieldSpec::text("username", "Username")
                .required("Username is required")
                .rule(MinLength::new(4, "Username must be at least 4 characters"))
                .rule(MaxLength::new(20, "Username cannot exceed 20 characters"))
                .rule(Pattern::new(
                    USERNAME_REGEX.clone(),
                    "Username can only contain letters, numbers and underscores",
                )),
        )
        .field(
            FieldSpec::password("password", "Password")
                .required("Password is required")
                .rule(MinLength::new(6, "Password must be at least 6 characters"))
                .create_only(),
        )
        .field(
            FieldSpec::text("fullName", "Full Name")
                .required("Full name is required")
                .rule(MinLength::new(2, "Name must be at least 2 characters"))
                .rule(MaxLength::new(50, "Name cannot exceed 50 characters")),
        )
        .field(
            FieldSpec::text("email", "Email")
                .required("Email is required")
                .rule(Email::new("Please provide a valid email")),
        )
        .field(
            FieldSpec::text("phone", "Phone Number")
                .rule(Pattern::new(PHONE_REGEX.clone(), "Please provide a valid phone number")),
        )
        .field(
            FieldSpec::text_area("address", "Address")
                .rule(MaxLength::new(200, "Address cannot exceed 200 characters")),
        )
        .field(FieldSpec::select("role", "Role", ROLES).required("Role is required"))
        .field(FieldSpec::number("xu", "Xu").rule(NumericRange::at_least(0.0, "Xu cannot be negative")))
        .field(FieldSpec::text("avatar", "Avatar URL"))
        .field(FieldSpec::boolean("isActive", "Is Active"))
        .column("username", "Username")
        .column("fullName", "Full Name")
        .column("email", "Email")
        .column("isActive", "Active")
}

pub fn menus() -> ResourceDescriptor {
    ResourceDescriptor::new(MENUS, "Menu")
        .codec(
            FlatteningCodec::new().composite(
                CompositeField::new("cookingTime")
                    .part("prep", "cookingTimePrep")
                    .part("cook", "cookingTimeCook"),
            ),
        )
        .field(FieldSpec::text("name", "Name").required("Please input the menu name!"))
        .field(
            FieldSpec::text_area("description", "Description")
                .rule(MaxLength::new(500, "Description cannot exceed 500 characters")),
        )
        .field(
            FieldSpec::number("price", "Price")
                .required("Please input the price!")
                .rule(NumericRange::at_least(0.0, "Price cannot be negative")),
        )
        .field(FieldSpec::select("category", "Category", CATEGORIES).required("Please select a category!"))
        .field(FieldSpec::multi_select("ingredients", "Ingredients", INGREDIENTS))
        .field(
            FieldSpec::number("cookingTimePrep", "Prep Time (min)")
                .rule(NumericRange::at_least(0.0, "Prep time cannot be negative")),
        )
        .field(
            FieldSpec::number("cookingTimeCook", "Cook Time (min)")
                .rule(NumericRange::at_least(0.0, "Cook time cannot be negative")),
        )
        .asset(AssetSlot::image(MENUS))
        .column("name", "Name")
        .column("price", "Price")
        .column("image", "Image")
}

/// All managed collections, in tab order.
pub fn builtin() -> Vec<Arc<ResourceDescriptor>> {
    vec![
        Arc::new(ingredients()),
        Arc::new(roles()),
        Arc::new(users()),
        Arc::new(menus()),
    ]
}

/// Looks up a built-in collection by its path segment.
pub fn find(collection: &str) -> Option<Arc<ResourceDescriptor>> {
    builtin()
        .into_iter()
        .find(|d| d.collection.eq_ignore_ascii_case(collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_draft;
    use serde_json::{Value, json};

    fn draft(value: Value) -> crate::core::FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builtin_order_and_lookup() {
        let names: Vec<String> = builtin().iter().map(|d| d.collection.clone()).collect();
        assert_eq!(names, vec!["ingredients", "roles", "users", "menus"]);
        assert!(find("Menus").is_some());
        assert!(find("categories").is_none());
    }

    #[test]
    fn test_ingredient_name_length() {
        let d = ingredients();
        assert!(validate_draft(&d.fields, &draft(json!({"name": "Salt"})), false).is_ok());
        assert!(validate_draft(&d.fields, &draft(json!({"name": "S"})), false).is_err());
    }

    #[test]
    fn test_user_rules() {
        let d = users();
        let valid = draft(json!({
            "username": "chef_01",
            "password": "secret1",
            "fullName": "Anh Nguyen",
            "email": "anh@example.com",
            "phone": "0912345678",
            "role": "r1",
            "xu": 10,
            "isActive": true
        }));
        assert!(validate_draft(&d.fields, &valid, false).is_ok());

        let mut bad = valid.clone();
        bad.insert("username".into(), json!("ab"));
        bad.insert("phone".into(), json!("12345"));
        bad.insert("xu".into(), json!(-5));
        let errors = validate_draft(&d.fields, &bad, false).unwrap_err();
        assert_eq!(errors.for_field("username").count(), 1);
        assert_eq!(errors.for_field("phone").count(), 1);
        assert_eq!(errors.for_field("xu").count(), 1);

        let mut edit = valid.clone();
        edit.remove("password");
        assert!(validate_draft(&d.fields, &edit, true).is_ok());
    }

    #[test]
    fn test_menu_has_image_slot_and_composite() {
        let d = menus();
        let slot = d.asset.as_ref().unwrap();
        assert_eq!(slot.field, "image");
        assert_eq!(slot.upload_path, "menus/upload");

        let payload = d.codec.to_wire_payload(&draft(json!({
            "name": "Pho",
            "cookingTimePrep": 10,
            "cookingTimeCook": 20
        })));
        assert_eq!(payload["cookingTime"], json!({"prep": 10, "cook": 20}));
    }
}
