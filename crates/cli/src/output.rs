//! Terminal output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use agora_storefront::api::{Category, Comment, Order, Product, User};
use agora_storefront::cart::CartItem;
use agora_storefront::error::AppError;

use agora_core::Price;

pub fn line(message: impl std::fmt::Display) {
    println!("{message}");
}

pub fn failure(error: &AppError) {
    eprintln!("error: {error}");
}

pub fn user(user: &User) {
    println!("{} <{}> (id {})", user.name, user.email, user.id);
    for (label, value) in [
        ("mobile", &user.mobile),
        ("birth date", &user.birth_date),
        ("gender", &user.gender),
        ("address", &user.address),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    for product in products {
        println!(
            "{:>6}  {:<40}  {:>10}",
            product.id.to_string(),
            product.name,
            product.price.to_string()
        );
    }
}

pub fn comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("No reviews yet.");
        return;
    }
    for comment in comments {
        let own = if comment.is_own { " (yours)" } else { "" };
        println!(
            "#{} {}/5 by {}{own}",
            comment.id,
            comment.score.get(),
            comment.author
        );
        if let Some(body) = &comment.body {
            println!("    {body}");
        }
    }
}

pub fn categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories.");
        return;
    }
    for category in categories {
        println!("{:>6}  {}", category.id.to_string(), category.name);
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        println!(
            "#{:<6} {:<12} {:>10}  {}",
            order.id.to_string(),
            order.status,
            order.total.to_string(),
            order.created_at.as_deref().unwrap_or("-")
        );
    }
}

pub fn order(order: &Order) {
    println!("Order #{} ({})", order.id, order.status);
    if let Some(created_at) = &order.created_at {
        println!("  placed: {created_at}");
    }
    for item in &order.items {
        println!(
            "  {:>3} x {:<40} {:>10}",
            item.quantity,
            item.name,
            item.price.to_string()
        );
    }
    println!("  total: {}", order.total);
}

pub fn cart(items: &[CartItem], subtotal: Price) {
    if items.is_empty() {
        println!("Cart is empty.");
        return;
    }
    for item in items {
        println!(
            "{:>6}  {:>3} x {:<40} {:>10}",
            item.product_id.to_string(),
            item.quantity,
            item.name,
            item.line_total().to_string()
        );
    }
    println!("subtotal: {subtotal}");
}
