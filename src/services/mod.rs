/*!
 * # Services
 */

pub mod reports;
